use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ConfigBuilder;
use crate::core::{SyncJob, SyncOutcome};
use crate::error::{Result, SongSyncError, SyncError};
use crate::services::SimpleServices;
use crate::signal_handler::CancelToken;
use crate::utils::progress::{ProgressMessages, ProgressReporter, UiMode};

#[derive(Args)]
pub struct SyncArgs {
    /// Songs API base URL (overrides config)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Bearer token for the songs API (overrides config)
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Path to the OpenLP songs database (overrides config and auto-detection)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Fetch songs and report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(args: SyncArgs, services: &SimpleServices, ui_mode: UiMode) -> Result<()> {
    let services = apply_overrides(&args, services)?;
    let db_path = services.resolve_database_path(None)?;
    let client = services.create_api_client()?;
    let service = services.create_sync_service(&db_path);

    info!("Syncing {} into {}", client.base_url(), db_path.display());

    if args.dry_run {
        let songs = client.fetch_all_songs().await?;
        let plan = service.plan(&songs)?;

        println!("🔍 Dry run, nothing was written");
        println!("  🎵 Songs from API: {}", songs.len());
        println!("  ➕ Would create: {}", plan.to_create);
        println!("  🔄 Would update: {}", plan.to_update);
        if plan.missing_id > 0 {
            println!("  ⚠️  Without id (skipped): {}", plan.missing_id);
        }
        if plan.unreadable_verses > 0 {
            println!("  ⚠️  Unreadable verses (skipped): {}", plan.unreadable_verses);
        }
        return Ok(());
    }

    let cancel = CancelToken::new();
    let signal_task = cancel.cancel_on_signal();

    let reporter = ProgressReporter::for_mode(ui_mode);
    let job = SyncJob::new(Arc::new(client), service, cancel.clone());
    let (mut progress, handle) = job.spawn();

    while let Some(message) = progress.recv().await {
        if cancel.is_cancelled() {
            reporter.message(ProgressMessages::CANCELLING);
        } else {
            reporter.message(&message);
        }
    }

    let outcome = handle.await?;
    signal_task.abort();
    reporter.finish();

    match outcome {
        SyncOutcome::Completed(report) => {
            info!("Processed {} songs", report.processed());
            println!("✅ {}", report.summary());
            if report.errors > 0 {
                warn!("{} songs could not be synced; rerun with --verbose for details", report.errors);
            }
            Ok(())
        }
        SyncOutcome::Cancelled => Err(SongSyncError::Cancelled),
        SyncOutcome::Failed(message) => {
            let detail = message.strip_prefix("Sync failed: ").unwrap_or(&message);
            Err(SyncError::Failed(detail.to_string()).into())
        }
    }
}

/// Command-line flags take precedence over everything in the loaded config
fn apply_overrides(args: &SyncArgs, services: &SimpleServices) -> Result<SimpleServices> {
    let mut builder = ConfigBuilder::from_config(&services.config())?;

    if let Some(ref url) = args.api_url {
        builder = builder.api_url(url.as_str())?;
    }
    if args.api_key.is_some() {
        builder = builder.api_key(args.api_key.as_deref());
    }
    if args.db.is_some() {
        builder = builder.database_path(args.db.as_ref())?;
    }

    Ok(SimpleServices::new(builder.build()?))
}
