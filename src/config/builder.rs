use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::config::validation::ConfigValidator;
use crate::config::env::{EnvVars, EnvParser};
use crate::config::{Config, DEFAULT_API_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECONDS};

pub const PAGE_SIZE_RANGE: (usize, usize) = (1, 1000);
pub const REQUEST_TIMEOUT_RANGE: (u64, u64) = (1, 600);

/// Surrounding whitespace and trailing slashes are dropped
pub fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Configuration builder with validation and type safety
#[derive(Default)]
pub struct ConfigBuilder {
    api_url: Option<String>,
    api_key: Option<Option<String>>,
    database_path: Option<Option<PathBuf>>,
    page_size: Option<usize>,
    request_timeout_seconds: Option<u64>,
    prefer_lyrics_xml: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder with every value of an existing configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new()
            .api_url(config.api_url.clone())?
            .api_key(config.api_key.clone())
            .database_path(config.database_path.as_ref())?
            .page_size(config.page_size)?
            .request_timeout_seconds(config.request_timeout_seconds)?
            .prefer_lyrics_xml(config.prefer_lyrics_xml))
    }

    /// Set API URL with validation; surrounding whitespace and trailing slashes are dropped
    pub fn api_url<S: Into<String>>(mut self, url: S) -> Result<Self> {
        let url = url.into();
        ConfigValidator::validate_api_url(&url)?;
        self.api_url = Some(normalize_api_url(&url));
        Ok(self)
    }

    /// Set API key; a blank key clears it
    pub fn api_key<S: Into<String>>(mut self, key: Option<S>) -> Self {
        let key = key
            .map(Into::into)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self.api_key = Some(key);
        self
    }

    /// Set database path with validation; `None` means auto-detect
    pub fn database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref().to_path_buf();
            ConfigValidator::validate_db_path(&path)?;
            self.database_path = Some(Some(path));
        } else {
            self.database_path = Some(None);
        }
        Ok(self)
    }

    /// Set page size with validation
    pub fn page_size(mut self, size: usize) -> Result<Self> {
        ConfigValidator::validate_range(size, PAGE_SIZE_RANGE.0, PAGE_SIZE_RANGE.1, "page size")?;
        self.page_size = Some(size);
        Ok(self)
    }

    /// Set request timeout with validation
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Result<Self> {
        ConfigValidator::validate_range(
            seconds,
            REQUEST_TIMEOUT_RANGE.0,
            REQUEST_TIMEOUT_RANGE.1,
            "request timeout seconds",
        )?;
        self.request_timeout_seconds = Some(seconds);
        Ok(self)
    }

    pub fn prefer_lyrics_xml(mut self, prefer: bool) -> Self {
        self.prefer_lyrics_xml = Some(prefer);
        self
    }

    /// Load values from environment variables with validation
    pub fn load_from_env(mut self) -> Result<Self> {
        if let Some(url) = EnvParser::parse_string(EnvVars::API_URL, Some(ConfigValidator::validate_api_url))? {
            self = self.api_url(url)?;
        }

        if let Some(key) = EnvParser::parse_string(EnvVars::API_KEY, None)? {
            self = self.api_key(Some(key));
        }

        if let Some(path) = EnvParser::parse_path(EnvVars::DATABASE_PATH)? {
            self = self.database_path(Some(path))?;
        }

        if let Some(size) = EnvParser::parse_usize(EnvVars::PAGE_SIZE, PAGE_SIZE_RANGE.0, PAGE_SIZE_RANGE.1)? {
            self = self.page_size(size)?;
        }

        if let Some(timeout) = EnvParser::parse_u64(
            EnvVars::REQUEST_TIMEOUT_SECONDS,
            REQUEST_TIMEOUT_RANGE.0,
            REQUEST_TIMEOUT_RANGE.1,
        )? {
            self = self.request_timeout_seconds(timeout)?;
        }

        if let Some(prefer) = EnvParser::parse_bool(EnvVars::PREFER_LYRICS_XML)? {
            self = self.prefer_lyrics_xml(prefer);
        }

        Ok(self)
    }

    /// Build the configuration with defaults
    pub fn build(self) -> Result<Config> {
        let config = Config {
            api_url: self.api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: self.api_key
                .unwrap_or(None),
            database_path: self.database_path
                .unwrap_or(None),
            page_size: self.page_size
                .unwrap_or(DEFAULT_PAGE_SIZE),
            request_timeout_seconds: self.request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            prefer_lyrics_xml: self.prefer_lyrics_xml
                .unwrap_or(false),
        };

        config.validate()?;

        Ok(config)
    }
}

impl Config {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_api_url(&self.api_url)?;

        if let Some(ref path) = self.database_path {
            ConfigValidator::validate_db_path(path)?;
        }

        ConfigValidator::validate_range(self.page_size, PAGE_SIZE_RANGE.0, PAGE_SIZE_RANGE.1, "page size")?;

        ConfigValidator::validate_range(
            self.request_timeout_seconds,
            REQUEST_TIMEOUT_RANGE.0,
            REQUEST_TIMEOUT_RANGE.1,
            "request timeout seconds",
        )?;

        Ok(())
    }
}
