//! Email notifications
//!
//! Provider-agnostic mailer: "http" posts to a REST email API, "console"
//! logs the message via tracing (development/testing). Notification failures
//! are reported to the caller but never abort the operation that triggered
//! them.

use async_trait::async_trait;

use crate::config::EmailConfig;
use crate::{Error, Result};

/// Outgoing message
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Email delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Logs messages instead of sending them
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email (console provider): {}",
            message.text
        );
        Ok(())
    }
}

/// REST email API client (bearer-authenticated)
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": message.to,
                "subject": message.subject,
                "html": message.html,
                "text": message.text,
            }))
            .send()
            .await
            .map_err(|e| Error::External(format!("Email send failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::External(format!(
                "Email API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Build the configured mailer
pub fn mailer_from_config(config: &EmailConfig) -> std::sync::Arc<dyn Mailer> {
    match config.provider.as_str() {
        "http" => std::sync::Arc::new(HttpMailer::new(config)),
        other => {
            if other != "console" {
                tracing::warn!("Unknown email provider '{}', using console", other);
            }
            std::sync::Arc::new(ConsoleMailer)
        }
    }
}

// ---- Notification templates ----

pub fn submission_received(to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "We received your portfolio submission".to_string(),
        html: format!(
            "<h2>Thanks for submitting, {name}!</h2>\
             <p>We have received your portfolio content and it is now in our review queue.</p>\
             <p>Most portfolios are live within 24 hours.</p>"
        ),
        text: format!(
            "Thanks for submitting, {name}! We have received your portfolio content \
             and it is now in our review queue. Most portfolios are live within 24 hours."
        ),
    }
}

pub fn submission_approved(to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Your portfolio has been approved".to_string(),
        html: format!(
            "<h2>Great news, {name}!</h2>\
             <p>Your portfolio submission has been approved and is now being built.</p>\
             <p>We will email you again once your portfolio is live with your URL.</p>"
        ),
        text: format!(
            "Great news, {name}! Your portfolio submission has been approved and is \
             now being built. We will email you once it is live."
        ),
    }
}

pub fn submission_rejected(to: &str, name: &str, reason: &str, refunded: bool) -> EmailMessage {
    let refund_html = if refunded {
        "<p>A full refund has been issued to your original payment method. \
         It may take 5-10 business days to appear.</p>"
    } else {
        ""
    };
    let refund_text = if refunded {
        " A full refund has been issued."
    } else {
        ""
    };
    EmailMessage {
        to: to.to_string(),
        subject: "Update on your portfolio submission".to_string(),
        html: format!(
            "<h2>Hi {name},</h2>\
             <p>Unfortunately, we were unable to proceed with your portfolio submission.</p>\
             <p><strong>Reason:</strong> {reason}</p>{refund_html}"
        ),
        text: format!(
            "Hi {name}, unfortunately we were unable to proceed with your portfolio \
             submission. Reason: {reason}.{refund_text}"
        ),
    }
}

pub fn edits_requested(to: &str, name: &str, edits: &[String]) -> EmailMessage {
    let list_html: String = edits.iter().map(|e| format!("<li>{e}</li>")).collect();
    EmailMessage {
        to: to.to_string(),
        subject: "Edits requested for your portfolio".to_string(),
        html: format!(
            "<h2>Hi {name},</h2>\
             <p>We have reviewed your submission and would like to request some changes \
             before we build your portfolio:</p><ul>{list_html}</ul>\
             <p>Please update your submission from your dashboard.</p>"
        ),
        text: format!(
            "Hi {name}, we have reviewed your submission and would like to request some \
             changes: {}. Please update your submission from your dashboard.",
            edits.join("; ")
        ),
    }
}

pub fn portfolio_deployed(to: &str, name: &str, primary_host: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Your portfolio is LIVE".to_string(),
        html: format!(
            "<h2>Your portfolio is live, {name}!</h2>\
             <p>Your portfolio has been deployed and is ready to share:</p>\
             <p><a href=\"https://{primary_host}\">https://{primary_host}</a></p>\
             <p>Add this link to your resume, LinkedIn, and job applications.</p>"
        ),
        text: format!(
            "Your portfolio is live, {name}! Visit it at: https://{primary_host}. \
             Add this link to your resume, LinkedIn, and job applications."
        ),
    }
}

pub fn refund_processed(to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Refund processed for your payment".to_string(),
        html: format!(
            "<h2>Hi {name},</h2>\
             <p>A refund has been processed for your payment.</p>\
             <p>The refund should appear on your original payment method within \
             5-10 business days.</p>"
        ),
        text: format!(
            "Hi {name}, a refund has been processed for your payment. It should \
             appear within 5-10 business days."
        ),
    }
}
