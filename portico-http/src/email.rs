//! Email provider client
//!
//! Thin REST client for transactional mail. An empty API key disables
//! delivery: sends are logged and reported as skipped, so local stacks run
//! without a provider account.

use portico_config::EmailConfig;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::HttpError;

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    config: EmailConfig,
}

#[derive(Debug, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Provider-side metadata about a delivered message.
#[derive(Debug, Clone)]
pub struct EmailReceipt {
    pub provider_message_id: Option<String>,
    pub delivered: bool,
}

impl EmailClient {
    pub fn new(http: reqwest::Client, config: EmailConfig) -> Self {
        Self { http, config }
    }

    pub async fn send(&self, email: OutboundEmail) -> Result<EmailReceipt, HttpError> {
        if self.config.api_key.is_empty() {
            info!(to = %email.to, subject = %email.subject, "email provider disabled, skipping send");
            return Ok(EmailReceipt {
                provider_message_id: None,
                delivered: false,
            });
        }

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "from": self.config.from_address,
                "to": [email.to],
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "email provider rejected message");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(EmailReceipt {
            provider_message_id: body
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            delivered: true,
        })
    }

    /// Verification email with the raw token embedded in the link.
    pub fn verification_email(to: &str, name: &str, verify_url: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: "Verify your email address".to_string(),
            html: format!(
                "<p>Hi {},</p>\
                 <p>Confirm your email address to finish setting up your account.</p>\
                 <p><a href=\"{}\">Verify email</a></p>\
                 <p>This link expires in 24 hours.</p>",
                name, verify_url
            ),
        }
    }

    pub fn invitation_email(to: &str, organization_name: &str, accept_url: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: format!("You have been invited to {}", organization_name),
            html: format!(
                "<p>You have been invited to join <b>{}</b>.</p>\
                 <p><a href=\"{}\">Accept invitation</a></p>",
                organization_name, accept_url
            ),
        }
    }
}
