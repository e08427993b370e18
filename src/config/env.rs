use std::env;
use std::path::PathBuf;
use crate::error::{Result, SongSyncError};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const API_URL: &'static str = "SONGSYNC_API_URL";
    pub const API_KEY: &'static str = "SONGSYNC_API_KEY";
    pub const DATABASE_PATH: &'static str = "SONGSYNC_DATABASE_PATH";
    pub const PAGE_SIZE: &'static str = "SONGSYNC_PAGE_SIZE";
    pub const REQUEST_TIMEOUT_SECONDS: &'static str = "SONGSYNC_REQUEST_TIMEOUT_SECONDS";
    pub const PREFER_LYRICS_XML: &'static str = "SONGSYNC_PREFER_LYRICS_XML";

    // Special environment variables
    pub const CI: &'static str = "CI";
    pub const FORCE_PROGRESS: &'static str = "SONGSYNC_FORCE_PROGRESS";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as string with validation
    pub fn parse_string(var_name: &str, validator: Option<fn(&str) -> Result<()>>) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(SongSyncError::Validation(format!(
                    "Environment variable {} contains invalid UTF-8",
                    var_name
                )))
            }
        }
    }

    /// Parse environment variable as PathBuf
    pub fn parse_path(var_name: &str) -> Result<Option<PathBuf>> {
        Ok(Self::parse_string(var_name, None)?.map(PathBuf::from))
    }

    /// Parse environment variable as boolean with validation
    pub fn parse_bool(var_name: &str) -> Result<Option<bool>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            match value_str.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(SongSyncError::Validation(format!(
                    "Invalid boolean value in {}: '{}'. Use: true/false, 1/0, yes/no, on/off",
                    var_name, value_str
                )))
            }
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as u64 with range validation
    pub fn parse_u64(var_name: &str, min: u64, max: u64) -> Result<Option<u64>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            let value = value_str.parse::<u64>().map_err(|_| {
                SongSyncError::Validation(format!(
                    "Invalid number in {}: '{}'. Must be a positive integer",
                    var_name, value_str
                ))
            })?;

            if value < min || value > max {
                return Err(SongSyncError::Validation(format!(
                    "Value in {} must be between {} and {}, got {}",
                    var_name, min, max, value
                )));
            }

            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as usize with range validation
    pub fn parse_usize(var_name: &str, min: usize, max: usize) -> Result<Option<usize>> {
        Ok(Self::parse_u64(var_name, min as u64, max as u64)?.map(|value| value as usize))
    }

    /// Check if environment variable is present (for boolean flags)
    pub fn is_present(var_name: &str) -> bool {
        env::var(var_name).is_ok()
    }

    /// Get all SONGSYNC environment variables for display; the API key is masked
    pub fn get_all_songsync_vars() -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| key.starts_with("SONGSYNC_"))
            .map(|(key, value)| {
                if key == EnvVars::API_KEY {
                    (key, "********".to_string())
                } else {
                    (key, value)
                }
            })
            .collect();
        vars.sort();
        vars
    }
}
