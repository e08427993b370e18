use clap::Args;

use crate::config::openlp_database_candidates;
use crate::error::{ConfigError, Result};

#[derive(Args)]
pub struct DetectArgs {
    /// Show every location that was checked
    #[arg(short, long)]
    all: bool,
}

pub async fn execute(args: DetectArgs) -> Result<()> {
    let candidates = openlp_database_candidates();

    if args.all {
        for candidate in &candidates {
            let mark = if candidate.exists() { "✅" } else { "❌" };
            println!("{} {}", mark, candidate.display());
        }
        println!();
    }

    match candidates.into_iter().find(|path| path.exists()) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(ConfigError::DatabaseNotFound.into()),
    }
}
