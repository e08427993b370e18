//! Error handling for the songsync-cli application
//!
//! This module provides a hierarchical error system with user-friendly
//! messages. Errors are typed per boundary (HTTP, host database, config,
//! synchronization) so each layer can decide whether to propagate or count.

use rusqlite::ffi;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SongSyncError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("Transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),

    #[error("Database file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Table '{table}' not found in {path}; is this an OpenLP songs database?")]
    MissingTable { table: String, path: PathBuf },

    #[error("Database corruption detected")]
    Corruption,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("API response invalid: {reason}")]
    InvalidResponse { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("OpenLP songs database not found; set database_path in the configuration")]
    DatabaseNotFound,

    #[error("Environment variable error: {0}")]
    Environment(#[from] std::env::VarError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync failed: {0}")]
    Failed(String),

    #[error("Sync cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SongSyncError>;

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi::Error { code: ffi::ErrorCode::DatabaseCorrupt, .. }, _) => {
                DatabaseError::Corruption
            }
            _ => DatabaseError::Query(err),
        }
    }
}

impl From<rusqlite::Error> for SongSyncError {
    fn from(err: rusqlite::Error) -> Self {
        SongSyncError::Database(err.into())
    }
}

impl From<reqwest::Error> for SongSyncError {
    fn from(err: reqwest::Error) -> Self {
        SongSyncError::Network(NetworkError::Http(err))
    }
}

impl From<std::io::Error> for SongSyncError {
    fn from(err: std::io::Error) -> Self {
        SongSyncError::Internal(err.into())
    }
}

impl From<serde_json::Error> for SongSyncError {
    fn from(err: serde_json::Error) -> Self {
        SongSyncError::Network(NetworkError::InvalidResponse { reason: err.to_string() })
    }
}

impl From<toml::de::Error> for SongSyncError {
    fn from(err: toml::de::Error) -> Self {
        SongSyncError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<toml::ser::Error> for SongSyncError {
    fn from(err: toml::ser::Error) -> Self {
        SongSyncError::Config(ConfigError::Serialize(err))
    }
}

impl From<tokio::task::JoinError> for SongSyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SongSyncError::Internal(err.into())
    }
}
