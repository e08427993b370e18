//! Application configuration
//!
//! Resolution order, lowest to highest priority: built-in defaults, the TOML
//! config file, `SONGSYNC_*` environment variables, then command-line flags.

pub mod builder;
pub mod env;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use directories::ProjectDirs;
use tracing::debug;

pub use builder::ConfigBuilder;
pub use env::EnvParser;

use crate::core::services::songs_api::SongsApiClient;
use crate::error::{ConfigError, Result, SongSyncError};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the songs API, e.g. http://localhost:3000/api
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token sent with every API request (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Path to the OpenLP songs database; auto-detected when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Records requested per API page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Use the backend's stored lyrics XML verbatim when present
    #[serde(default)]
    pub prefer_lyrics_xml: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            database_path: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            prefer_lyrics_xml: false,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Pick up a .env file during development
        dotenvy::dotenv().ok();

        let config_file = Self::resolve_config_path(config_path)?;
        let file_config = Self::from_file(&config_file)?;

        let config = ConfigBuilder::from_config(&file_config)?
            .load_from_env()?
            .build()?;

        // Persist the file-level settings on first run, never the env overrides
        if !config_file.exists() {
            file_config.save(&config_file)?;
        }

        Ok(config)
    }

    /// Settings stored in the file alone, defaults when the file is absent
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&content)?)
    }

    pub fn resolve_config_path(config_path: Option<&str>) -> Result<PathBuf> {
        match config_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Self::default_config_path(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("org", "songsync", "songsync-cli")
            .ok_or_else(|| SongSyncError::Internal(anyhow::anyhow!("Failed to determine project directories")))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Configured database path, or the first default OpenLP location that exists
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.database_path {
            return Ok(path.clone());
        }

        detect_openlp_database().ok_or_else(|| ConfigError::DatabaseNotFound.into())
    }

    pub fn create_api_client(&self) -> Result<SongsApiClient> {
        SongsApiClient::new(
            &self.api_url,
            self.api_key.as_deref(),
            self.page_size,
            self.request_timeout(),
        )
    }
}

/// Locations where OpenLP keeps its songs database, most legacy first
pub fn openlp_database_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".openlp").join("songs.sqlite"));
        candidates.push(home.join("AppData").join("Local").join("OpenLP").join("songs.sqlite"));
    }

    if let Some(data_dir) = dirs::data_dir() {
        candidates.push(data_dir.join("openlp").join("songs").join("songs.sqlite"));
        candidates.push(data_dir.join("openlp").join("data").join("songs").join("songs.sqlite"));
    }

    candidates
}

pub fn detect_openlp_database() -> Option<PathBuf> {
    openlp_database_candidates().into_iter().find(|path| path.exists())
}
