// src/pipeline/update.rs

//! Update pass orchestration.
//!
//! Walks every user's subscriptions, runs the change detector per
//! site, and mails one digest per user whose sites changed. Per-site
//! failures are logged and skipped; the pass always runs to
//! completion.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::mail::Mailer;
use crate::models::{Config, PassOutcome, Site, User};
use crate::services::{ChangeDetector, notifier};
use crate::storage::SubscriptionStore;

/// Run one full pass over all users and their subscribed sites.
pub async fn run_pass(
    config: &Config,
    store: &dyn SubscriptionStore,
    mailer: &dyn Mailer,
) -> Result<PassOutcome> {
    let detector = ChangeDetector::new(&config.http, store)?;
    let users = store.all_users().await?;

    let mut outcome = PassOutcome {
        users_total: users.len(),
        ..PassOutcome::default()
    };

    for user in users {
        let sites = store.sites_for_user(&user).await?;
        let changed = check_sites(config, &detector, &sites, &mut outcome).await;

        if changed.is_empty() {
            continue;
        }

        log::info!(
            "Changes detected on {} site(s), notifying user {}",
            changed.len(),
            user.name
        );
        deliver(mailer, &user, &changed, &mut outcome).await;
    }

    Ok(outcome)
}

/// Check one user's sites, concurrently up to the configured bound,
/// and return the changed ones in subscription order.
async fn check_sites(
    config: &Config,
    detector: &ChangeDetector<'_>,
    sites: &[Site],
    outcome: &mut PassOutcome,
) -> Vec<Site> {
    let delay = Duration::from_millis(config.http.request_delay_ms);
    let concurrency = config.http.max_concurrent.max(1);

    let mut changed: Vec<(usize, Site)> = Vec::new();
    let mut reports = stream::iter(sites.iter().enumerate())
        .map(|(index, site)| async move { (index, site, detector.detect(site).await) })
        .buffer_unordered(concurrency);

    while let Some((index, site, result)) = reports.next().await {
        outcome.sites_checked += 1;
        match result {
            Ok(report) if report.changed => {
                outcome.sites_changed += 1;
                changed.push((index, report.site));
            }
            Ok(_) => {}
            Err(error) => {
                outcome.site_failures += 1;
                log::warn!("Skipping {} ({}): {}", site.name, site.url, error);
            }
        }

        if delay.as_millis() > 0 {
            tokio::time::sleep(delay).await;
        }
    }

    // The unordered join scrambles completion order; batches list
    // sites in subscription order.
    changed.sort_by_key(|(index, _)| *index);
    changed.into_iter().map(|(_, site)| site).collect()
}

/// Compose and send one digest. Delivery failure is logged, never
/// propagated: the fingerprint history is already committed and must
/// not be rolled back.
async fn deliver(mailer: &dyn Mailer, user: &User, changed: &[Site], outcome: &mut PassOutcome) {
    let message = notifier::compose(user, changed);
    match mailer.send(user, &message).await {
        Ok(receipt) => {
            outcome.messages_sent += 1;
            log::info!(
                "Notified {} <{}> (status {})",
                user.name,
                user.email,
                receipt.status
            );
        }
        Err(error) => {
            outcome.delivery_failures += 1;
            log::error!("Failed to deliver notification to {}: {}", user.email, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::mail::{DeliveryReceipt, EmailMessage};
    use crate::models::NewSite;
    use crate::services::fingerprint::fingerprint;
    use crate::storage::MemoryStore;
    use crate::utils::testing::spawn_page_server;

    /// Mailer that records every composed message.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, EmailMessage)>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn sent(&self) -> Vec<(String, EmailMessage)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &User, message: &EmailMessage) -> Result<DeliveryReceipt> {
            if self.fail {
                return Err(AppError::delivery(500, "transport down"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.email.clone(), message.clone()));
            Ok(DeliveryReceipt { status: 202 })
        }
    }

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.http.request_delay_ms = 0;
        config.http.timeout_secs = 5;
        config
    }

    fn page(content: &str) -> String {
        format!("<html><body><div id=\"watch\">{content}</div></body></html>")
    }

    async fn subscribe(store: &MemoryStore, email: &str, name: &str, url: String) -> Site {
        store
            .add_site(
                email,
                NewSite {
                    name: name.to_string(),
                    url,
                    selector: "div#watch".to_string(),
                },
            )
            .await
            .unwrap()
    }

    /// Pre-record a fingerprint so the next pass sees prior history.
    async fn seed_history(store: &MemoryStore, site_id: i64, content: &str) {
        store
            .append_fingerprint(site_id, &fingerprint(content.as_bytes()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_changed_sites_batch_into_one_message() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();

        let addr_a = spawn_page_server(page("stable")).await;
        let addr_b = spawn_page_server(page("fresh b")).await;
        let addr_c = spawn_page_server(page("fresh c")).await;

        let a = subscribe(&store, "erin@example.com", "A", format!("http://{addr_a}/")).await;
        let b = subscribe(&store, "erin@example.com", "B", format!("http://{addr_b}/")).await;
        let c = subscribe(&store, "erin@example.com", "C", format!("http://{addr_c}/")).await;

        seed_history(&store, a.id, "stable").await;
        seed_history(&store, b.id, "old b").await;
        seed_history(&store, c.id, "old c").await;

        let mailer = RecordingMailer::default();
        let outcome = run_pass(&quick_config(), &store, &mailer).await.unwrap();

        assert_eq!(outcome.sites_checked, 3);
        assert_eq!(outcome.sites_changed, 2);
        assert_eq!(outcome.messages_sent, 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let (recipient, message) = &sent[0];
        assert_eq!(recipient, "erin@example.com");
        assert_eq!(message.subject, "B, C Updated");
        assert!(!message.plain_body.contains("A -"));
    }

    #[tokio::test]
    async fn test_no_changes_means_no_message() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();

        let addr = spawn_page_server(page("stable")).await;
        let site = subscribe(&store, "erin@example.com", "A", format!("http://{addr}/")).await;
        seed_history(&store, site.id, "stable").await;

        let mailer = RecordingMailer::default();
        let outcome = run_pass(&quick_config(), &store, &mailer).await.unwrap();

        assert_eq!(outcome.messages_sent, 0);
        assert!(mailer.sent().is_empty());
        // History still advances on an unchanged observation.
        assert_eq!(store.fingerprint_history(site.id).len(), 2);
    }

    #[tokio::test]
    async fn test_first_observation_never_notifies() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();

        let addr = spawn_page_server(page("brand new")).await;
        let site = subscribe(&store, "erin@example.com", "A", format!("http://{addr}/")).await;

        let mailer = RecordingMailer::default();
        let outcome = run_pass(&quick_config(), &store, &mailer).await.unwrap();

        assert_eq!(outcome.sites_changed, 0);
        assert!(mailer.sent().is_empty());
        assert_eq!(store.fingerprint_history(site.id).len(), 1);
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();

        let addr = spawn_page_server(page("new content")).await;
        let site = subscribe(&store, "erin@example.com", "A", format!("http://{addr}/")).await;
        seed_history(&store, site.id, "old content").await;

        let mailer = RecordingMailer::default();
        let config = quick_config();

        let first = run_pass(&config, &store, &mailer).await.unwrap();
        assert_eq!(first.messages_sent, 1);

        // Remote content unchanged: the fingerprint was already
        // advanced, so the same change is not re-flagged.
        let second = run_pass(&config, &store, &mailer).await.unwrap();
        assert_eq!(second.sites_changed, 0);
        assert_eq!(second.messages_sent, 0);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_site_but_not_pass() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();

        let addr_y = spawn_page_server(page("fresh y")).await;
        let addr_z = spawn_page_server(page("fresh z")).await;

        // Nothing listens on the failing site's port.
        let x = subscribe(&store, "erin@example.com", "X", "http://127.0.0.1:1/".to_string()).await;
        let y = subscribe(&store, "erin@example.com", "Y", format!("http://{addr_y}/")).await;
        let z = subscribe(&store, "erin@example.com", "Z", format!("http://{addr_z}/")).await;

        seed_history(&store, y.id, "old y").await;
        seed_history(&store, z.id, "old z").await;

        let mailer = RecordingMailer::default();
        let outcome = run_pass(&quick_config(), &store, &mailer).await.unwrap();

        assert_eq!(outcome.site_failures, 1);
        assert_eq!(outcome.sites_changed, 2);
        assert!(store.fingerprint_history(x.id).is_empty());

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.subject, "Y, Z Updated");
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();
        store.create_user("Sam", "sam@example.com").await.unwrap();

        let addr_a = spawn_page_server(page("fresh a")).await;
        let addr_b = spawn_page_server(page("stable b")).await;

        let a = subscribe(&store, "erin@example.com", "A", format!("http://{addr_a}/")).await;
        let b = subscribe(&store, "sam@example.com", "B", format!("http://{addr_b}/")).await;

        seed_history(&store, a.id, "old a").await;
        seed_history(&store, b.id, "stable b").await;

        let mailer = RecordingMailer::default();
        let outcome = run_pass(&quick_config(), &store, &mailer).await.unwrap();

        assert_eq!(outcome.users_total, 2);
        assert_eq!(outcome.messages_sent, 1);

        let sent = mailer.sent();
        assert_eq!(sent[0].0, "erin@example.com");
        assert_eq!(sent[0].1.subject, "A Updated");
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_history_committed() {
        let store = MemoryStore::new();
        store.create_user("Erin", "erin@example.com").await.unwrap();

        let addr = spawn_page_server(page("new content")).await;
        let site = subscribe(&store, "erin@example.com", "A", format!("http://{addr}/")).await;
        seed_history(&store, site.id, "old content").await;

        let mailer = RecordingMailer::failing();
        let outcome = run_pass(&quick_config(), &store, &mailer).await.unwrap();

        assert_eq!(outcome.delivery_failures, 1);
        assert_eq!(outcome.messages_sent, 0);
        // The fingerprint advanced regardless; the change will not be
        // re-flagged next pass.
        assert_eq!(store.fingerprint_history(site.id).len(), 2);
    }
}
