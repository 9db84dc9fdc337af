// src/storage/sqlite.rs

//! SQLite-backed record store.
//!
//! The schema is created once when the store is opened; domain types
//! stay plain structs with no knowledge of the backing tables. A
//! mutex around the connection serializes reads and writes, which
//! keeps each site's read-then-append sequence atomic even when the
//! pass fetches concurrently.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{AppError, Result};
use crate::models::{Digest, NewSite, Site, User};
use crate::storage::SubscriptionStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sites (
    id          INTEGER PRIMARY KEY,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    url         TEXT NOT NULL UNIQUE,
    selector    TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fingerprints (
    id          INTEGER PRIMARY KEY,
    site_id     INTEGER NOT NULL REFERENCES sites(id),
    digest      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
";

/// SQLite record store backend.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema
    /// exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::store("store connection mutex poisoned"))
    }

    /// Full fingerprint history for a site, oldest first. Useful for
    /// inspection; the pipeline itself only ever reads the last entry.
    pub fn fingerprint_history(&self, site_id: i64) -> Result<Vec<Digest>> {
        let conn = self.conn()?;
        let mut statement =
            conn.prepare("SELECT digest FROM fingerprints WHERE site_id = ?1 ORDER BY id ASC")?;
        let digests = statement
            .query_map(params![site_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(digests.into_iter().map(Digest::from_hex).collect())
    }
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, email FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    async fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)",
            params![name, email, Utc::now().to_rfc3339()],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    async fn add_site(&self, user_email: &str, site: NewSite) -> Result<Site> {
        let user = self
            .find_user_by_email(user_email)
            .await?
            .ok_or_else(|| AppError::store(format!("no user with email {user_email}")))?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sites (user_id, name, url, selector, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                site.name,
                site.url,
                site.selector,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(Site {
            id: conn.last_insert_rowid(),
            user_id: user.id,
            name: site.name,
            url: site.url,
            selector: site.selector,
        })
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare("SELECT id, name, email FROM users ORDER BY id ASC")?;
        let users = statement
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn sites_for_user(&self, user: &User) -> Result<Vec<Site>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "SELECT id, user_id, name, url, selector FROM sites
             WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let sites = statement
            .query_map(params![user.id], |row| {
                Ok(Site {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    url: row.get(3)?,
                    selector: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    async fn last_fingerprint(&self, site_id: i64) -> Result<Option<Digest>> {
        let conn = self.conn()?;
        let digest = conn
            .query_row(
                "SELECT digest FROM fingerprints WHERE site_id = ?1
                 ORDER BY id DESC LIMIT 1",
                params![site_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(digest.map(Digest::from_hex))
    }

    async fn append_fingerprint(&self, site_id: i64, digest: &Digest) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO fingerprints (site_id, digest, created_at) VALUES (?1, ?2, ?3)",
            params![site_id, digest.as_hex(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
