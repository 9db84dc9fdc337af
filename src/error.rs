// src/error.rs

//! Unified error handling for the pagewatch application.

use thiserror::Error;

/// Result type alias for pagewatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed (network, timeout, or non-2xx status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Record store operation failed
    #[error("Store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Selector matched no element in the fetched document
    #[error("Selector '{selector}' matched no element")]
    Extraction { selector: String },

    /// Record store invariant violation
    #[error("Store error: {0}")]
    Store(String),

    /// Notification transport rejected the message
    #[error("Delivery failed with status {status}: {body}")]
    Delivery { status: u16, body: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error for a selector that matched nothing.
    pub fn extraction(selector: impl Into<String>) -> Self {
        Self::Extraction {
            selector: selector.into(),
        }
    }

    /// Create a record store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a delivery error from a transport response.
    pub fn delivery(status: u16, body: impl Into<String>) -> Self {
        Self::Delivery {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
