use std::path::Path;
use url::Url;
use crate::error::{Result, SongSyncError};

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an API base URL: non-empty, http(s) scheme, parseable
    pub fn validate_api_url(url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SongSyncError::Validation("API URL must not be empty".to_string()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SongSyncError::Validation(format!(
                "API URL must start with http:// or https://, got: {}",
                url
            )));
        }

        Url::parse(url).map_err(|e| {
            SongSyncError::Validation(format!("Invalid API URL '{}': {}", url, e))
        })?;
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(SongSyncError::Validation(format!(
                "{} must be between {} and {}, got {}",
                field_name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate database file extension
    pub fn validate_db_path(path: &Path) -> Result<()> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sqlite") | Some("sqlite3") | Some("db") => Ok(()),
            Some(_) => Err(SongSyncError::Validation(format!(
                "Database file should have .sqlite, .sqlite3, or .db extension, got: {}",
                path.display()
            ))),
            None => Err(SongSyncError::Validation(format!(
                "Database file should have an extension (.sqlite, .sqlite3, .db), got: {}",
                path.display()
            ))),
        }
    }
}
