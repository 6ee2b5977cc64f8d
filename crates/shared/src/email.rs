//! Email dispatch for notification digests.
//!
//! `EmailSender` is the seam the notification dispatcher talks to; the
//! `lettre` SMTP transport in `EmailService` is the production implementation.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::EmailConfig;

/// Template for a reminder covering exactly one subscription.
pub const TEMPLATE_RENEWAL_REMINDER: &str = "subscription_renewal_reminder";
/// Template for a digest covering several subscriptions.
pub const TEMPLATE_RENEWAL_DIGEST: &str = "subscription_renewal_digest";

/// Email service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    /// No renderer exists for the template key.
    #[error("Unknown email template: {0}")]
    UnknownTemplate(String),
}

impl EmailError {
    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::SendError(_))
    }
}

/// A request to the email collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    /// Recipient address.
    pub recipient: String,
    /// Template key selecting subject and body layout.
    pub template_key: String,
    /// Template data.
    pub data: serde_json::Value,
}

/// Anything that can deliver an [`EmailRequest`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers one email.
    async fn send(&self, request: &EmailRequest) -> Result<(), EmailError>;
}

/// SMTP-backed email sender.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build(),
        )
    }

    /// Renders subject and plain-text body for a request.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::UnknownTemplate` for template keys without a renderer.
    pub fn render(&self, request: &EmailRequest) -> Result<(String, String), EmailError> {
        let items = request
            .data
            .get("items")
            .and_then(serde_json::Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let subject = match request.template_key.as_str() {
            TEMPLATE_RENEWAL_REMINDER => {
                let name = items
                    .first()
                    .and_then(|item| item.get("name"))
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("Your subscription");
                format!("{name} renews soon")
            }
            TEMPLATE_RENEWAL_DIGEST => format!("{} subscriptions renew soon", items.len()),
            other => return Err(EmailError::UnknownTemplate(other.to_string())),
        };

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let field = |key: &str| {
                item.get(key)
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), String::from))
                    .unwrap_or_default()
            };
            lines.push(format!(
                "- {}: {} {} on {}",
                field("name"),
                field("amount"),
                field("currency"),
                field("nextBillingDate")
            ));
        }

        let body = format!(
            "Hi,\n\nThe following subscriptions are about to renew:\n\n{}\n\nManage them at {}/subscriptions\n\nThe {} Team",
            lines.join("\n"),
            self.config.app_url,
            self.config.from_name
        );

        Ok((subject, body))
    }

    /// Sends a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl EmailSender for EmailService {
    async fn send(&self, request: &EmailRequest) -> Result<(), EmailError> {
        let (subject, body) = self.render(request)?;
        self.send_email(&request.recipient, &subject, &body).await
    }
}

#[cfg(test)]
#[path = "email_tests.rs"]
mod tests;
