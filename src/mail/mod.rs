// src/mail/mod.rs

//! Outbound notification transport.
//!
//! Message composition is core logic (`crate::services::notifier`);
//! delivery goes through the `Mailer` trait so the pipeline never
//! depends on a concrete transport. The production backend posts to
//! the SendGrid mail API.

pub mod sendgrid;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::User;

// Re-export for convenience
pub use sendgrid::SendGridMailer;

/// A composed notification, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

/// Transport acknowledgement for a delivered message.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryReceipt {
    pub status: u16,
}

/// Trait for notification delivery backends.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message to one recipient.
    async fn send(&self, to: &User, message: &EmailMessage) -> Result<DeliveryReceipt>;
}
