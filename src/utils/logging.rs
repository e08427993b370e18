use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::utils::progress::UiMode;

pub fn init_logging(verbose: bool, ui_mode: UiMode) -> Result<()> {
    // With a live spinner on the terminal only warnings are worth interleaving
    let level = if verbose {
        Level::DEBUG
    } else if ui_mode == UiMode::Interactive {
        Level::WARN
    } else {
        Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        // Filter out noisy dependencies
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("rusqlite=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
