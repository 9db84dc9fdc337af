// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Notification sender settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Record store settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::config("http.max_concurrent must be > 0"));
        }
        if !self.notifier.from_email.contains('@') {
            return Err(AppError::config("notifier.from_email is not an address"));
        }
        if self.store.db_path.trim().is_empty() {
            return Err(AppError::config("store.db_path is empty"));
        }
        Ok(())
    }
}

/// HTTP client and fetch behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between completed fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent fetches within one pass
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Notification sender identity and transport endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Display name on outgoing mail
    #[serde(default = "defaults::from_name")]
    pub from_name: String,

    /// Sender address on outgoing mail
    #[serde(default = "defaults::from_email")]
    pub from_email: String,

    /// Mail API endpoint
    #[serde(default = "defaults::api_endpoint")]
    pub api_endpoint: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            from_name: defaults::from_name(),
            from_email: defaults::from_email(),
            api_endpoint: defaults::api_endpoint(),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path
    #[serde(default = "defaults::db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; pagewatch/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Notifier defaults
    pub fn from_name() -> String {
        "Pagewatch".into()
    }
    pub fn from_email() -> String {
        "notifications@pagewatch.invalid".into()
    }
    pub fn api_endpoint() -> String {
        "https://api.sendgrid.com/v3/mail/send".into()
    }

    // Store defaults
    pub fn db_path() -> String {
        "data.db".into()
    }
}
