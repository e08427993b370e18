use clap::Args;
use std::path::PathBuf;

use crate::core::SongsDatabase;
use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct StatusArgs {
    /// Path to the OpenLP songs database (overrides config and auto-detection)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

pub async fn execute(args: StatusArgs, services: &SimpleServices) -> Result<()> {
    let db_path = services.resolve_database_path(args.db.as_deref())?;
    let db = SongsDatabase::open(&db_path)?;

    let total = db.count_songs()?;
    let synced = db.synced_songs()?;

    println!("📁 Database: {}", db.path().display());
    println!("🎵 Songs: {} total, {} synced", total, synced.len());

    if synced.is_empty() {
        println!("💡 Nothing synced yet. Run 'songsync sync' to import songs.");
        return Ok(());
    }

    println!();
    for song in &synced {
        println!(
            "  {:>6}  {:<24}  {:<32}  {}",
            song.id,
            song.backend_id,
            song.title,
            song.last_synced.as_deref().unwrap_or("never")
        );
    }

    Ok(())
}
