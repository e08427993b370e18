use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cooperative cancellation flag shared between the CLI and the sync worker
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancel on the first Ctrl-C (or SIGTERM on unix)
    pub fn cancel_on_signal(&self) -> JoinHandle<()> {
        let token = self.clone();

        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            warn!("Cancelling sync...");
            token.cancel();
        })
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            debug!("SIGTERM handler unavailable: {}", e);
            let _ = signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => debug!("Received Ctrl-C"),
        _ = sigterm.recv() => debug!("Received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        debug!("Received Ctrl-C");
    }
}
