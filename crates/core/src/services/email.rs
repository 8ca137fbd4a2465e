//! Email service.
//!
//! Rendering lives here; delivery goes through a [`MailTransport`] so the
//! server can pick SMTP or the log, and tests can capture messages.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use yamdb_common::{
    AppError, AppResult,
    config::{EmailConfig, SmtpConfig},
};

/// Subject of the confirmation code mail.
pub const CONFIRMATION_SUBJECT: &str = "YaMDb confirmation code";

/// A rendered plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outgoing mail delivery.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. Failures surface to the caller.
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Shared transport handle.
pub type Mailer = Arc<dyn MailTransport>;

/// SMTP relay delivery via lettre.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Build a relay client. No connection is made until the first send.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::Config(format!("invalid SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|e| AppError::Email(format!("invalid sender address: {e}")))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.inner
            .send(email)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent via SMTP");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email (not sent, no SMTP relay configured)"
        );
        Ok(())
    }
}

/// Keeps messages in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryTransport {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far.
    #[must_use]
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent message sent to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.messages().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// Pick the transport the configuration asks for.
pub fn transport_from_config(config: &EmailConfig) -> AppResult<Mailer> {
    match &config.smtp {
        Some(smtp) => Ok(Arc::new(SmtpTransport::new(smtp)?)),
        None => Ok(Arc::new(LogTransport)),
    }
}

/// Renders and sends account mails.
#[derive(Clone)]
pub struct EmailService {
    transport: Mailer,
    from_address: String,
}

impl EmailService {
    /// Create a new email service.
    #[must_use]
    pub fn new(transport: Mailer, config: &EmailConfig) -> Self {
        Self {
            transport,
            from_address: config.from_address.clone(),
        }
    }

    /// Mail a confirmation code to the user.
    pub async fn send_confirmation_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> AppResult<()> {
        let message = EmailMessage {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: CONFIRMATION_SUBJECT.to_string(),
            body: format!(
                "Hello, {username}!\n\nYour confirmation code: {code}\n\n\
                 Exchange it for an access token at /api/v1/auth/token/."
            ),
        };

        self.transport.send(&message).await
    }
}

/// Extract the code from a rendered confirmation mail.
#[must_use]
pub fn confirmation_code_from(message: &EmailMessage) -> Option<&str> {
    message
        .body
        .lines()
        .find_map(|line| line.strip_prefix("Your confirmation code: "))
        .map(str::trim)
}
