// src/models/subscription.rs

//! Users and their site subscriptions.

/// A registered user. Identified by a unique email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A watched site belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: i64,
    pub user_id: i64,

    /// Display name used in notification subjects and bodies
    pub name: String,

    /// Page URL, unique across the whole store
    pub url: String,

    /// CSS selector for the watched fragment. Empty means the whole
    /// document body.
    pub selector: String,
}

/// A site subscription as supplied by the caller, before the store
/// assigns it an id.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub name: String,
    pub url: String,
    pub selector: String,
}
