use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::core::lyrics::LyricsFormatter;
use crate::core::services::SongsApiClient;
use crate::core::sync::SyncService;
use crate::error::Result;

pub struct SimpleServices {
    config: Arc<Config>,
}

impl SimpleServices {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn create_api_client(&self) -> Result<SongsApiClient> {
        self.config.create_api_client()
    }

    /// Explicit path wins over the configured one, which wins over auto-detection
    pub fn resolve_database_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => self.config.resolve_database_path()?,
        };
        debug!("Using songs database at {}", path.display());
        Ok(path)
    }

    pub fn create_sync_service(&self, db_path: &Path) -> SyncService {
        SyncService::new(db_path).with_formatter(self.lyrics_formatter())
    }

    pub fn lyrics_formatter(&self) -> LyricsFormatter {
        LyricsFormatter::with_lyrics_xml(self.config.prefer_lyrics_xml)
    }
}
