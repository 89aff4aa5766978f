//! SMTP delivery

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use offboard_domain::{OffboardError, Result};
use tracing::info;

/// SMTP relay coordinates resolved from the tenant's email configuration.
#[derive(Debug, Clone)]
pub struct SmtpServer {
    pub host: String,
    pub port: u16,
}

/// One rendered notification ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Delivery seam so dispatch logic can be tested without a relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, server: &SmtpServer, message: &OutgoingEmail) -> Result<()>;
}

/// Plain SMTP relay delivery (internal relays, no TLS negotiation).
pub struct SmtpMailer;

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|err| OffboardError::Notify(format!("invalid email address `{address}`: {err}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, server: &SmtpServer, message: &OutgoingEmail) -> Result<()> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&message.from)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML);

        for to in &message.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        for cc in &message.cc {
            builder = builder.cc(parse_mailbox(cc)?);
        }

        let email = builder
            .body(message.html_body.clone())
            .map_err(|err| OffboardError::Notify(format!("failed to build email: {err}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server.host)
            .port(server.port)
            .build();

        transport
            .send(email)
            .await
            .map_err(|err| OffboardError::Notify(format!("SMTP delivery failed: {err}")))?;

        info!(
            host = %server.host,
            recipients = message.to.len(),
            subject = %message.subject,
            "notification email sent"
        );
        Ok(())
    }
}

/// Split a comma-separated recipient list, dropping empty segments.
pub(crate) fn split_recipients(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
