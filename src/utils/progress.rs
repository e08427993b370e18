use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::env::{EnvParser, EnvVars};

/// How progress should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Spinner on an interactive terminal
    Interactive,
    /// Plain log lines for pipes, CI and cron
    Plain,
}

impl UiMode {
    pub fn detect() -> Self {
        if EnvParser::is_present(EnvVars::FORCE_PROGRESS) {
            return UiMode::Interactive;
        }

        let has_ci = EnvParser::is_present(EnvVars::CI);
        let is_tty = atty::is(atty::Stream::Stderr);

        if has_ci || !is_tty {
            UiMode::Plain
        } else {
            UiMode::Interactive
        }
    }
}

/// Centralized progress bar creation utilities
pub struct ProgressUtils;

impl ProgressUtils {
    /// Spinner used while the sync job runs; the song count is unknown until fetched
    pub fn create_sync_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

/// Routes job progress either to a spinner or to the log
pub enum ProgressReporter {
    Spinner(ProgressBar),
    Log,
}

impl ProgressReporter {
    pub fn for_mode(mode: UiMode) -> Self {
        match mode {
            UiMode::Interactive => ProgressReporter::Spinner(ProgressUtils::create_sync_spinner()),
            UiMode::Plain => ProgressReporter::Log,
        }
    }

    pub fn message(&self, message: &str) {
        match self {
            ProgressReporter::Spinner(pb) => pb.set_message(message.to_string()),
            // Per-record lines are too chatty for plain output
            ProgressReporter::Log if message.starts_with(ProgressMessages::PER_SONG_PREFIX) => {
                debug!("{}", message)
            }
            ProgressReporter::Log => info!("{}", message),
        }
    }

    pub fn finish(&self) {
        if let ProgressReporter::Spinner(pb) = self {
            pb.finish_and_clear();
        }
    }
}

/// Common progress messages
pub struct ProgressMessages;

impl ProgressMessages {
    pub const PER_SONG_PREFIX: &'static str = "Processing song ";
    pub const CANCELLING: &'static str = "Cancelling...";
}
