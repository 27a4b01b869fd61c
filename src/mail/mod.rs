//! Outbound email for account activation and password resets.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::MailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail provider rejected message to {recipient} (status {status}): {body}")]
    Rejected {
        recipient: String,
        status: u16,
        body: String,
    },
}

/// Accepts a message for delivery. Success means the provider took the message, not that
/// it reached the inbox.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct SendGridAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization {
    to: Vec<SendGridAddress>,
}

#[derive(Debug, Serialize)]
struct SendGridContent {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct SendGridMessage {
    personalizations: Vec<SendGridPersonalization>,
    from: SendGridAddress,
    subject: String,
    content: Vec<SendGridContent>,
}

/// Sends through the SendGrid v3 HTTP API, one request per recipient
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    sender_email: String,
    sender_name: String,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>, sender_email: impl Into<String>, sender_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            sender_email: sender_email.into(),
            sender_name: sender_name.into(),
            endpoint: SENDGRID_SEND_URL.to_string(),
        }
    }

    fn message(&self, recipient: &str, subject: &str, plain_body: &str, html_body: &str) -> SendGridMessage {
        SendGridMessage {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress {
                    email: recipient.to_string(),
                    name: None,
                }],
            }],
            from: SendGridAddress {
                email: self.sender_email.clone(),
                name: Some(self.sender_name.clone()).filter(|n| !n.is_empty()),
            },
            subject: subject.to_string(),
            // SendGrid requires text/plain before text/html
            content: vec![
                SendGridContent {
                    kind: "text/plain",
                    value: plain_body.to_string(),
                },
                SendGridContent {
                    kind: "text/html",
                    value: html_body.to_string(),
                },
            ],
        }
    }

    async fn deliver(&self, recipient: &str, subject: &str, plain_body: &str, html_body: &str) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.message(recipient, subject, plain_body, html_body))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Sent email to {} with subject: {}", recipient, subject);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            "Error sending email to {} with subject {}: {}",
            recipient,
            subject,
            body
        );
        Err(MailError::Rejected {
            recipient: recipient.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        for recipient in recipients {
            self.deliver(recipient, subject, plain_body, html_body).await?;
        }
        Ok(())
    }
}

/// Writes a line per recipient to the log instead of sending
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        _plain_body: &str,
        _html_body: &str,
    ) -> Result<(), MailError> {
        for recipient in recipients {
            tracing::info!("Email to {} with subject '{}' not sent: no mail provider configured", recipient, subject);
        }
        Ok(())
    }
}

/// SendGrid when an API key is configured, otherwise the logging mailer
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match &config.sendgrid_api_key {
        Some(key) => Arc::new(SendGridMailer::new(
            key.clone(),
            config.sender_email.clone(),
            config.sender_name.clone(),
        )),
        None => {
            tracing::warn!("SENDGRID_API_KEY is not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}
