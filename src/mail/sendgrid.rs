// src/mail/sendgrid.rs

//! SendGrid mail API backend.
//!
//! Pure REST client: one POST of a typed JSON payload per message.
//! The endpoint is configurable so tests can point it at a local
//! server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::mail::{DeliveryReceipt, EmailMessage, Mailer};
use crate::models::{NotifierConfig, User};

const SEND_TIMEOUT_SECS: u64 = 30;

/// Mailer backed by the SendGrid v3 `mail/send` endpoint.
pub struct SendGridMailer {
    client: Client,
    api_key: String,
    endpoint: String,
    from_name: String,
    from_email: String,
}

/// Request body for `mail/send`.
#[derive(Serialize)]
struct MailPayload<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime_type: &'a str,
    value: &'a str,
}

impl SendGridMailer {
    /// Create a mailer from an API key and sender configuration.
    pub fn new(api_key: impl Into<String>, config: &NotifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: config.api_endpoint.clone(),
            from_name: config.from_name.clone(),
            from_email: config.from_email.clone(),
        })
    }

    fn payload<'a>(&'a self, to: &'a User, message: &'a EmailMessage) -> MailPayload<'a> {
        MailPayload {
            personalizations: [Personalization {
                to: [Address {
                    email: &to.email,
                    name: &to.name,
                }],
            }],
            from: Address {
                email: &self.from_email,
                name: &self.from_name,
            },
            subject: &message.subject,
            // Plain part must precede the HTML part.
            content: [
                Content {
                    mime_type: "text/plain",
                    value: &message.plain_body,
                },
                Content {
                    mime_type: "text/html",
                    value: &message.html_body,
                },
            ],
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, to: &User, message: &EmailMessage) -> Result<DeliveryReceipt> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(to, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(status.as_u16(), body));
        }

        Ok(DeliveryReceipt {
            status: status.as_u16(),
        })
    }
}
