//! Background sync job: fetch everything, then upsert on a worker thread

use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::services::SongSource;
use crate::core::sync::{SyncReport, SyncService};
use crate::error::{SongSyncError, SyncError};
use crate::signal_handler::CancelToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Cancelled,
    Failed(String),
}

pub struct SyncJob {
    source: Arc<dyn SongSource>,
    service: Arc<SyncService>,
    cancel: CancelToken,
}

impl SyncJob {
    pub fn new(source: Arc<dyn SongSource>, service: SyncService, cancel: CancelToken) -> Self {
        Self {
            source,
            service: Arc::new(service),
            cancel,
        }
    }

    /// Run the job in the background; progress messages arrive on the receiver
    pub fn spawn(self) -> (UnboundedReceiver<String>, JoinHandle<SyncOutcome>) {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(progress_tx));
        (progress_rx, handle)
    }

    pub async fn run(self, progress: UnboundedSender<String>) -> SyncOutcome {
        let report = |message: &str| {
            let _ = progress.send(message.to_string());
        };

        report("Connecting to API...");
        report("Fetching songs from API...");

        let songs = match self.source.fetch_all_songs().await {
            Ok(songs) => songs,
            Err(e) => {
                error!("Error during sync: {}", e);
                return SyncOutcome::Failed(failure_message(e));
            }
        };

        if self.cancel.is_cancelled() {
            info!("Sync cancelled before database update");
            return SyncOutcome::Cancelled;
        }

        report(&format!("Found {} songs. Updating database...", songs.len()));

        let service = self.service.clone();
        let cancel = self.cancel.clone();
        let worker_progress = progress.clone();

        let result = tokio::task::spawn_blocking(move || {
            service.sync_songs(
                &songs,
                |message| {
                    let _ = worker_progress.send(message.to_string());
                },
                &cancel,
            )
        })
        .await;

        match result {
            Ok(Ok(report)) => SyncOutcome::Completed(report),
            Ok(Err(SongSyncError::Sync(SyncError::Cancelled))) => SyncOutcome::Cancelled,
            Ok(Err(e)) => SyncOutcome::Failed(failure_message(e)),
            Err(e) => {
                error!("Sync worker stopped unexpectedly: {}", e);
                SyncOutcome::Failed(format!("Sync failed: {}", e))
            }
        }
    }
}

fn failure_message(err: SongSyncError) -> String {
    match err {
        SongSyncError::Sync(inner) => inner.to_string(),
        other => format!("Sync failed: {}", other),
    }
}
