// src/services/detector.rs

//! Per-site change detection.
//!
//! Fetches a site's current content, fingerprints the watched
//! fragment, and compares against the most recent stored fingerprint.
//! Every successful observation is appended to the site's history,
//! changed or not; a fetch or extraction failure leaves the history
//! untouched.

use reqwest::Client;

use crate::error::Result;
use crate::models::{ChangeReport, Digest, HttpConfig, Site};
use crate::services::extract::extract_fragment;
use crate::services::fingerprint::fingerprint;
use crate::storage::SubscriptionStore;
use crate::utils::http;

/// Service that runs the fetch → extract → fingerprint → compare
/// sequence for one site at a time.
pub struct ChangeDetector<'a> {
    client: Client,
    store: &'a dyn SubscriptionStore,
}

impl<'a> ChangeDetector<'a> {
    /// Create a detector with a configured HTTP client.
    pub fn new(config: &HttpConfig, store: &'a dyn SubscriptionStore) -> Result<Self> {
        Ok(Self {
            client: http::create_client(config)?,
            store,
        })
    }

    /// Check one site for changes since the last observation.
    pub async fn detect(&self, site: &Site) -> Result<ChangeReport> {
        let raw_html = http::fetch_page(&self.client, &site.url).await?;
        log::debug!("Downloaded content from {}", site.url);
        self.observe(site, &raw_html).await
    }

    /// The fetch-free tail of `detect`: extract, fingerprint, compare
    /// against history, and record the new fingerprint.
    ///
    /// A first-ever observation records its fingerprint but reports
    /// `changed = false`; there is nothing to compare against.
    pub async fn observe(&self, site: &Site, raw_html: &str) -> Result<ChangeReport> {
        let fragment = extract_fragment(raw_html, &site.selector)?;
        let digest = fingerprint(fragment.as_bytes());

        let previous = self.store.last_fingerprint(site.id).await?;
        let changed = match &previous {
            Some(prev) => *prev != digest,
            None => false,
        };

        // History always reflects the latest observed state.
        self.store.append_fingerprint(site.id, &digest).await?;

        log::debug!(
            "Site {} ({}): {}",
            site.name,
            site.url,
            describe(&previous, changed)
        );

        Ok(ChangeReport {
            site: site.clone(),
            changed,
        })
    }
}

fn describe(previous: &Option<Digest>, changed: bool) -> &'static str {
    match (previous, changed) {
        (None, _) => "first observation",
        (Some(_), true) => "content changed",
        (Some(_), false) => "unchanged",
    }
}
