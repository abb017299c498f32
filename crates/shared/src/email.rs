//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. The default relay is Mailgun's SMTP
//! endpoint, but any authenticated SMTP server works.

use std::time::Duration;

use lettre::{
    message::{header::ContentType, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
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
}

/// Email service for sending transactional emails.
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

    /// Creates an SMTP transport bounded by the configured timeout.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build();

        Ok(transport)
    }

    /// Builds the message for [`EmailService::send`].
    ///
    /// An empty `html` yields a plain-text message, otherwise the message is
    /// `multipart/alternative` with both bodies.
    fn build_message(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<Message, EmailError> {
        let builder = Message::builder()
            .from(
                self.config
                    .from
                    .parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject);

        let message = if html.is_empty() {
            builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.to_string())
        } else {
            builder.multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))
        };

        message.map_err(|e| EmailError::BuildError(e.to_string()))
    }

    /// Sends an email with a plain-text body and an optional HTML body.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid, the message cannot be
    /// built, or the relay does not accept it within the timeout.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        let email = self.build_message(to, subject, text, html)?;

        let transport = self.create_transport()?;
        let response = transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        info!(
            to = %to,
            code = %response.code(),
            "Email accepted by relay"
        );

        Ok(())
    }
}
