// src/models/mod.rs

//! Domain models for the pagewatch application.

mod config;
mod report;
mod subscription;

// Re-export all public types
pub use config::{Config, HttpConfig, NotifierConfig, StoreConfig};
pub use report::{ChangeReport, PassOutcome};
pub use subscription::{NewSite, Site, User};

/// Fixed-width content fingerprint, hex-encoded.
///
/// Two fingerprints compare equal exactly when the underlying content
/// bytes were identical. Ordering or partial matching is never used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(String);

impl Digest {
    /// Wrap an already hex-encoded digest, e.g. one read back from the store.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex encoding of this digest.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
