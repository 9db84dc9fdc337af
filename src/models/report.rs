// src/models/report.rs

//! Per-pass results. None of these types are persisted.

use crate::models::Site;

/// Outcome of checking a single site within one pass.
#[derive(Debug, Clone)]
pub struct ChangeReport {
    pub site: Site,
    pub changed: bool,
}

/// Summary of a full update pass.
#[derive(Debug, Default)]
pub struct PassOutcome {
    pub users_total: usize,
    pub sites_checked: usize,
    pub sites_changed: usize,
    pub site_failures: usize,
    pub messages_sent: usize,
    pub delivery_failures: usize,
}
