use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::builder::{normalize_api_url, PAGE_SIZE_RANGE, REQUEST_TIMEOUT_RANGE};
use crate::config::validation::ConfigValidator;
use crate::config::{Config as AppConfig, EnvParser};
use crate::error::{ConfigError, Result, SongSyncError};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show configuration file path
    Path,

    /// Reset configuration to defaults
    Reset,

    /// List all available configuration keys
    Keys,
}

/// `config_file` is the `--config` override, if any
pub async fn execute(args: ConfigArgs, config_file: Option<&str>) -> Result<()> {
    let config_path = AppConfig::resolve_config_path(config_file)?;

    match args.command {
        ConfigCommands::Show => {
            let config = effective_config(config_file, &config_path)?;
            println!("🔧 Current configuration:");
            println!("  🌐 api_url: {}", config.api_url);
            println!("  🔑 api_key: {}", mask_key(config.api_key.as_deref()));
            println!("  📁 database_path: {}", display_db_path(config.database_path.as_deref()));
            println!("  📦 page_size: {}", config.page_size);
            println!("  ⏱️  request_timeout_seconds: {}", config.request_timeout_seconds);
            println!("  📝 prefer_lyrics_xml: {}", config.prefer_lyrics_xml);

            // Show environment overrides if present
            let env_vars = EnvParser::get_all_songsync_vars();
            if !env_vars.is_empty() {
                println!("\n🌍 Environment overrides:");
                for (key, value) in env_vars {
                    println!("  {} = {}", key, value);
                }
            }
        }

        ConfigCommands::Set { key, value } => {
            set_value(&config_path, &key, &value)?;
            println!("✅ Configuration updated: {} = {}", key, value);
        }

        ConfigCommands::Get { key } => {
            let config = effective_config(config_file, &config_path)?;
            println!("{}", get_setting(&config, &key)?);
        }

        ConfigCommands::Path => {
            println!("{}", config_path.display());
        }

        ConfigCommands::Reset => {
            reset(&config_path)?;
            println!("✅ Configuration reset to defaults");
            println!("📁 Config file: {}", config_path.display());
        }

        ConfigCommands::Keys => {
            println!("📋 Available configuration keys:");
            println!();
            println!("🌐 Songs API:");
            println!("  api_url                  - Base URL of the songs API (e.g., https://songs.example.org/api)");
            println!("  api_key                  - Bearer token sent with each request (optional)");
            println!("  page_size                - Songs per page request ({}-{})", PAGE_SIZE_RANGE.0, PAGE_SIZE_RANGE.1);
            println!(
                "  request_timeout_seconds  - HTTP timeout per request ({}-{})",
                REQUEST_TIMEOUT_RANGE.0, REQUEST_TIMEOUT_RANGE.1
            );
            println!();
            println!("📁 OpenLP:");
            println!("  database_path            - Path to songs.sqlite (auto-detected when unset)");
            println!("  prefer_lyrics_xml        - Write the backend's stored lyrics XML when present");
            println!();
            println!("💡 Usage:");
            println!("  songsync config get <key>             - Get current value");
            println!("  songsync config set <key> <value>     - Set new value with validation");
            println!("  songsync config set api_key none      - Clear optional values");
            println!();
            println!("🌍 Environment Variables:");
            println!("  All config keys can be overridden with SONGSYNC_<KEY> env vars");
            println!("  Example: SONGSYNC_API_URL=https://songs.example.org/api");
        }
    }

    Ok(())
}

/// Fully resolved settings; falls back to the raw file when they do not validate
fn effective_config(config_file: Option<&str>, config_path: &Path) -> Result<AppConfig> {
    AppConfig::load(config_file).or_else(|e| {
        warn!("Configuration is invalid ({}); showing the file as written", e);
        AppConfig::from_file(config_path)
    })
}

/// Write one key into the file, leaving the other stored values as they are
fn set_value(config_path: &Path, key: &str, value: &str) -> Result<AppConfig> {
    let file_config = AppConfig::from_file(config_path)?;
    let new_config = apply_setting(&file_config, key, value)?;
    new_config.save(config_path)?;
    Ok(new_config)
}

fn reset(config_path: &Path) -> Result<()> {
    AppConfig::default().save(config_path)
}

/// Only the key being set is validated, so a bad stored value can be repaired
fn apply_setting(config: &AppConfig, key: &str, value: &str) -> Result<AppConfig> {
    let mut updated = config.clone();

    match key {
        "api_url" => {
            ConfigValidator::validate_api_url(value)?;
            updated.api_url = normalize_api_url(value);
        }
        "api_key" => {
            updated.api_key = optional_value(value).map(str::to_string);
        }
        "database_path" => {
            let path = optional_value(value).map(PathBuf::from);
            if let Some(ref path) = path {
                ConfigValidator::validate_db_path(path)?;
            }
            updated.database_path = path;
        }
        "page_size" => {
            let parsed = parse_number::<usize>(key, value, PAGE_SIZE_RANGE)?;
            ConfigValidator::validate_range(parsed, PAGE_SIZE_RANGE.0, PAGE_SIZE_RANGE.1, "page size")?;
            updated.page_size = parsed;
        }
        "request_timeout_seconds" => {
            let parsed = parse_number::<u64>(key, value, REQUEST_TIMEOUT_RANGE)?;
            ConfigValidator::validate_range(
                parsed,
                REQUEST_TIMEOUT_RANGE.0,
                REQUEST_TIMEOUT_RANGE.1,
                "request timeout seconds",
            )?;
            updated.request_timeout_seconds = parsed;
        }
        "prefer_lyrics_xml" => {
            updated.prefer_lyrics_xml = parse_bool_value(key, value)?;
        }
        _ => return Err(unknown_key(key)),
    }

    Ok(updated)
}

fn get_setting(config: &AppConfig, key: &str) -> Result<String> {
    let value = match key {
        "api_url" => config.api_url.clone(),
        "api_key" => config.api_key.clone().unwrap_or_else(|| "none".to_string()),
        "database_path" => display_db_path(config.database_path.as_deref()),
        "page_size" => config.page_size.to_string(),
        "request_timeout_seconds" => config.request_timeout_seconds.to_string(),
        "prefer_lyrics_xml" => config.prefer_lyrics_xml.to_string(),
        _ => return Err(unknown_key(key)),
    };

    Ok(value)
}

fn unknown_key(key: &str) -> SongSyncError {
    SongSyncError::Validation(format!(
        "Unknown configuration key: '{}'. Use 'songsync config keys' to see available keys",
        key
    ))
}

/// Blank or `none` clears an optional setting
fn optional_value(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed)
    }
}

fn display_db_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "auto-detect".to_string())
}

fn mask_key(key: Option<&str>) -> &'static str {
    match key {
        Some(_) => "********",
        None => "none",
    }
}

fn parse_number<T>(key: &str, value: &str, range: (T, T)) -> Result<T>
where
    T: std::str::FromStr + std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|_| {
        ConfigError::InvalidValue {
            field: key.to_string(),
            value: format!("'{}'. Must be a number between {} and {}", value, range.0, range.1),
        }
        .into()
    })
}

/// Helper function to parse boolean values with better error messages
fn parse_bool_value(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().trim() {
        "true" | "1" | "yes" | "on" | "enable" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disable" | "disabled" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: key.to_string(),
            value: format!("'{}'. Use: true/false, 1/0, yes/no, on/off, enable/disable", value),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_validates_and_applies() {
        let config = AppConfig::default();

        let updated = apply_setting(&config, "page_size", "250").unwrap();
        assert_eq!(updated.page_size, 250);

        let updated = apply_setting(&updated, "prefer_lyrics_xml", "yes").unwrap();
        assert!(updated.prefer_lyrics_xml);
        assert_eq!(updated.page_size, 250);

        assert!(apply_setting(&config, "page_size", "0").is_err());
        assert!(apply_setting(&config, "page_size", "lots").is_err());
        assert!(apply_setting(&config, "api_url", "songs.example.org").is_err());
        assert!(apply_setting(&config, "database_path", "/tmp/songs.txt").is_err());
        assert!(apply_setting(&config, "colour", "blue").is_err());
    }

    #[test]
    fn none_clears_optional_values() {
        let config = AppConfig {
            api_key: Some("secret".to_string()),
            database_path: Some(PathBuf::from("/srv/openlp/songs.sqlite")),
            ..AppConfig::default()
        };

        let cleared = apply_setting(&config, "api_key", "none").unwrap();
        assert!(cleared.api_key.is_none());

        let cleared = apply_setting(&cleared, "database_path", "").unwrap();
        assert!(cleared.database_path.is_none());
        assert_eq!(get_setting(&cleared, "database_path").unwrap(), "auto-detect");
    }

    #[test]
    fn get_reads_each_key() {
        let config = AppConfig::default();
        assert_eq!(get_setting(&config, "api_url").unwrap(), "http://localhost:3000/api");
        assert_eq!(get_setting(&config, "api_key").unwrap(), "none");
        assert_eq!(get_setting(&config, "request_timeout_seconds").unwrap(), "30");
        assert!(get_setting(&config, "nope").is_err());
    }

    #[test]
    fn bool_values() {
        assert!(parse_bool_value("prefer_lyrics_xml", "Enabled").unwrap());
        assert!(!parse_bool_value("prefer_lyrics_xml", "off").unwrap());
        assert!(matches!(
            parse_bool_value("prefer_lyrics_xml", "perhaps"),
            Err(SongSyncError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn out_of_range_file_can_be_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"http://localhost:3000/api\"\npage_size = 5000\n").unwrap();

        let stored = AppConfig::from_file(&path).unwrap();
        assert!(stored.validate().is_err());

        let repaired = set_value(&path, "page_size", "100").unwrap();
        assert_eq!(repaired.page_size, 100);
        let reloaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(reloaded.page_size, 100);
        assert!(reloaded.validate().is_ok());

        std::fs::write(&path, "page_size = 5000\n").unwrap();
        reset(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn unrelated_keys_can_be_set_on_a_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"http://localhost:3000/api\"\npage_size = 5000\n").unwrap();

        let updated = set_value(&path, "prefer_lyrics_xml", "on").unwrap();
        assert!(updated.prefer_lyrics_xml);
        assert_eq!(updated.page_size, 5000);
    }

    #[test]
    fn api_key_is_masked() {
        assert_eq!(mask_key(Some("secret")), "********");
        assert_eq!(mask_key(None), "none");
    }
}
