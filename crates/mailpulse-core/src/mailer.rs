//! Outbound mail transport

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    Address,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use mailpulse_common::config::SmtpConfig;
use mailpulse_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// A fully rendered HTML email for a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    /// Sender display name, may be empty
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub html: String,
}

/// Sender mailbox from a display name and a bare address.
///
/// The name is never parsed, so commas or quotes in it survive as-is and
/// lettre encodes them when the header is written.
pub fn sender_mailbox(from_name: &str, from_email: &str) -> Result<Mailbox> {
    let address: Address = from_email
        .trim()
        .parse()
        .map_err(|e| Error::Validation(format!("Invalid from address: {}", e)))?;
    let name = Some(from_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(Mailbox::new(name, address))
}

impl OutboundEmail {
    /// Build the MIME message
    pub fn to_message(&self) -> Result<Message> {
        let from = sender_mailbox(&self.from_name, &self.from_email)?;
        let to: Mailbox = self
            .to
            .parse()
            .map_err(|e| Error::Validation(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&self.subject)
            .header(ContentType::TEXT_HTML)
            .body(self.html.clone())
            .map_err(|e| Error::Validation(format!("Failed to build email: {}", e)))
    }
}

/// Transmits one email; a single attempt, no retries
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

/// SMTP mailer over lettre's async transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport from configuration
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| Error::Config(format!("Failed to create SMTP transport: {}", e)))?
        } else if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| Error::Config(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        info!(
            host = %config.host,
            port = config.port,
            tls = config.use_tls,
            starttls = config.use_starttls,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let message = email.to_message()?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| Error::Smtp(e.to_string()))?;

        debug!(to = %email.to, code = %response.code(), "Email accepted by relay");
        Ok(())
    }
}
