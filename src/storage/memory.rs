// src/storage/memory.rs

//! In-memory record store backend.
//!
//! Holds everything in a single mutex-guarded struct. Used by the test
//! suite and handy for dry runs where no database file should be left
//! behind. Semantics mirror `SqliteStore`, including unique-email,
//! unique-url, and append-only history.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Digest, NewSite, Site, User};
use crate::storage::SubscriptionStore;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sites: Vec<Site>,
    fingerprints: Vec<(i64, Digest)>,
}

/// In-process record store backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::store("store mutex poisoned"))
    }

    /// Full fingerprint history for a site, oldest first.
    ///
    /// # Panics
    /// Panics if the store mutex is poisoned; meant for tests and
    /// inspection, not the pipeline.
    pub fn fingerprint_history(&self, site_id: i64) -> Vec<Digest> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .fingerprints
            .iter()
            .filter(|(id, _)| *id == site_id)
            .map(|(_, digest)| digest.clone())
            .collect()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let mut inner = self.lock()?;
        if inner.users.iter().any(|u| u.email == email) {
            return Err(AppError::store(format!("email {email} already registered")));
        }
        let user = User {
            id: inner.users.len() as i64 + 1,
            name: name.to_string(),
            email: email.to_string(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn add_site(&self, user_email: &str, site: NewSite) -> Result<Site> {
        let mut inner = self.lock()?;
        let user_id = inner
            .users
            .iter()
            .find(|u| u.email == user_email)
            .map(|u| u.id)
            .ok_or_else(|| AppError::store(format!("no user with email {user_email}")))?;
        if inner.sites.iter().any(|s| s.url == site.url) {
            return Err(AppError::store(format!("url {} already watched", site.url)));
        }
        let site = Site {
            id: inner.sites.len() as i64 + 1,
            user_id,
            name: site.name,
            url: site.url,
            selector: site.selector,
        };
        inner.sites.push(site.clone());
        Ok(site)
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        Ok(self.lock()?.users.clone())
    }

    async fn sites_for_user(&self, user: &User) -> Result<Vec<Site>> {
        let inner = self.lock()?;
        Ok(inner
            .sites
            .iter()
            .filter(|s| s.user_id == user.id)
            .cloned()
            .collect())
    }

    async fn last_fingerprint(&self, site_id: i64) -> Result<Option<Digest>> {
        let inner = self.lock()?;
        Ok(inner
            .fingerprints
            .iter()
            .rev()
            .find(|(id, _)| *id == site_id)
            .map(|(_, digest)| digest.clone()))
    }

    async fn append_fingerprint(&self, site_id: i64, digest: &Digest) -> Result<()> {
        self.lock()?.fingerprints.push((site_id, digest.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_and_site_round_trip() {
        let store = MemoryStore::new();
        let user = store.create_user("Erin", "erin@example.com").await.unwrap();
        store
            .add_site(
                "erin@example.com",
                NewSite {
                    name: "A".to_string(),
                    url: "https://a.example.com".to_string(),
                    selector: "main".to_string(),
                },
            )
            .await
            .unwrap();

        let sites = store.sites_for_user(&user).await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].selector, "main");
    }

    #[tokio::test]
    async fn test_last_fingerprint_tracks_latest_append() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();
        let site = store
            .add_site(
                "erin@example.com",
                NewSite {
                    name: "A".to_string(),
                    url: "https://a.example.com".to_string(),
                    selector: String::new(),
                },
            )
            .await
            .unwrap();

        assert!(store.last_fingerprint(site.id).await.unwrap().is_none());

        let first = Digest::from_hex("aa".repeat(32));
        let second = Digest::from_hex("bb".repeat(32));
        store.append_fingerprint(site.id, &first).await.unwrap();
        store.append_fingerprint(site.id, &second).await.unwrap();

        assert_eq!(store.last_fingerprint(site.id).await.unwrap(), Some(second));
        assert_eq!(store.fingerprint_history(site.id).len(), 2);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();
        assert!(store.create_user("Dup", "erin@example.com").await.is_err());

        store
            .add_site(
                "erin@example.com",
                NewSite {
                    name: "A".to_string(),
                    url: "https://a.example.com".to_string(),
                    selector: String::new(),
                },
            )
            .await
            .unwrap();
        assert!(
            store
                .add_site(
                    "erin@example.com",
                    NewSite {
                        name: "B".to_string(),
                        url: "https://a.example.com".to_string(),
                        selector: String::new(),
                    },
                )
                .await
                .is_err()
        );
    }
}
