// src/storage/mod.rs

//! Record store abstractions for users, sites, and fingerprint history.
//!
//! The pipeline never touches a database handle directly; every
//! component receives a `&dyn SubscriptionStore`. Two backends exist:
//!
//! - `SqliteStore`: the production backend, one SQLite file
//! - `MemoryStore`: in-process backend for tests and dry runs
//!
//! Fingerprint history is append-only per site. Entries are never
//! edited or removed; the "current" fingerprint is always the most
//! recently appended one. Backends serialize their own writes, so a
//! pass may check sites concurrently.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Digest, NewSite, Site, User};

// Re-export for convenience
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Operations the change-detection pipeline needs from a record store.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Look up a user by unique email address.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Register a new user.
    async fn create_user(&self, name: &str, email: &str) -> Result<User>;

    /// Subscribe an existing user (by email) to a site.
    async fn add_site(&self, user_email: &str, site: NewSite) -> Result<Site>;

    /// Enumerate every registered user.
    async fn all_users(&self) -> Result<Vec<User>>;

    /// Enumerate a user's subscribed sites.
    async fn sites_for_user(&self, user: &User) -> Result<Vec<Site>>;

    /// The most recent fingerprint recorded for a site, if any.
    /// "Never observed" is `None`, not an error.
    async fn last_fingerprint(&self, site_id: i64) -> Result<Option<Digest>>;

    /// Append a fingerprint to a site's history.
    async fn append_fingerprint(&self, site_id: i64, digest: &Digest) -> Result<()>;
}
