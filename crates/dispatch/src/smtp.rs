use async_trait::async_trait;
use lettre::address::Address;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info, warn};

use crate::attachment;
use crate::backend::{Body, Delivery, EmailBackend, EmailMessage};
use crate::config::{SecurityMode, SmtpConfig};
use crate::error::DispatchError;

/// SMTP email delivery backend using `lettre`.
///
/// Every call to [`EmailBackend::send`] builds its own transport and drops
/// it afterwards, so no connection is shared between recipients.
#[derive(Debug, Clone)]
pub struct SmtpBackend {
    config: SmtpConfig,
}

impl SmtpBackend {
    /// Create a new `SmtpBackend` from the given SMTP configuration.
    pub fn new(config: SmtpConfig) -> Result<Self, DispatchError> {
        if config.host.trim().is_empty() {
            return Err(DispatchError::Configuration(
                "SMTP host must not be empty".to_owned(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }
}

#[async_trait]
impl EmailBackend for SmtpBackend {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, DispatchError> {
        debug!(to = %message.to, subject = %message.subject, "building SMTP message");
        let mut attachments = Vec::with_capacity(message.attachments.len());
        for path in &message.attachments {
            attachments.push(attachment::load(path).await?);
        }
        let lettre_message = build_message(message, attachments)?;

        let transport = build_transport(&self.config)?;
        info!(
            to = %message.to,
            host = %self.config.host,
            port = self.config.port,
            security = %self.config.security,
            "sending email via SMTP"
        );
        let response = transport.send(lettre_message).await.map_err(|e| {
            error!(to = %message.to, error = %e, "SMTP send failed");
            map_smtp_error(&e)
        })?;

        let delivery = delivery_for(&response);
        match &delivery {
            Delivery::Accepted { .. } => {
                info!(to = %message.to, "email sent successfully via SMTP");
            }
            Delivery::Rejected { reason } => {
                warn!(to = %message.to, response = %reason, "SMTP server did not accept the email");
            }
        }
        Ok(delivery)
    }

    async fn health_check(&self) -> Result<(), DispatchError> {
        debug!(host = %self.config.host, "performing SMTP health check");
        let transport = build_transport(&self.config)?;
        let connected = transport.test_connection().await.map_err(|e| {
            error!(error = %e, "SMTP health check failed");
            DispatchError::Connection(format!("SMTP health check failed: {e}"))
        })?;
        if !connected {
            error!("SMTP health check failed: server did not answer NOOP");
            return Err(DispatchError::Connection(
                "SMTP health check failed: server did not answer NOOP".to_owned(),
            ));
        }
        info!("SMTP health check passed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "smtp"
    }
}

/// Classify the final reply of a completed transaction.
///
/// lettre already returns negative replies as errors, which surface as
/// [`DispatchError::Transient`] or [`DispatchError::Permanent`]. A
/// non-positive reply that still reaches this point is reported as
/// [`Delivery::Rejected`].
fn delivery_for(response: &Response) -> Delivery {
    let text = response_text(response);
    if response.is_positive() {
        Delivery::Accepted {
            response: (!text.is_empty()).then_some(text),
        }
    } else {
        Delivery::Rejected { reason: text }
    }
}

fn response_text(response: &Response) -> String {
    let lines = response.message().collect::<Vec<_>>().join(" ");
    if lines.is_empty() {
        response.code().to_string()
    } else {
        format!("{} {lines}", response.code())
    }
}

fn parse_mailbox(kind: &str, value: &str) -> Result<Mailbox, DispatchError> {
    value
        .parse()
        .map_err(|e| DispatchError::InvalidAddress(format!("invalid {kind} address `{value}`: {e}")))
}

fn sender(msg: &EmailMessage) -> Result<Mailbox, DispatchError> {
    match &msg.from_name {
        Some(name) => {
            let address: Address = msg.from.parse().map_err(|e| {
                DispatchError::InvalidAddress(format!("invalid from address `{}`: {e}", msg.from))
            })?;
            Ok(Mailbox::new(Some(name.clone()), address))
        }
        None => parse_mailbox("from", &msg.from),
    }
}

enum Content {
    Single(SinglePart),
    Multi(MultiPart),
}

fn content(body: &Body) -> Content {
    match body {
        Body::Text(text) => Content::Single(SinglePart::plain(text.clone())),
        Body::Html {
            html,
            alt_text: None,
        } => Content::Single(SinglePart::html(html.clone())),
        Body::Html {
            html,
            alt_text: Some(text),
        } => Content::Multi(MultiPart::alternative_plain_html(text.clone(), html.clone())),
    }
}

/// Build a `lettre::Message` for one recipient.
///
/// With attachments the body is wrapped in `multipart/mixed`, followed by
/// the attachment parts in order.
fn build_message(
    msg: &EmailMessage,
    attachments: Vec<SinglePart>,
) -> Result<Message, DispatchError> {
    let mut builder = Message::builder()
        .from(sender(msg)?)
        .to(parse_mailbox("recipient", &msg.to)?)
        .subject(&msg.subject);

    if let Some(ref cc) = msg.cc {
        builder = builder.cc(parse_mailbox("CC", cc)?);
    }

    if let Some(ref bcc) = msg.bcc {
        builder = builder.bcc(parse_mailbox("BCC", bcc)?);
    }

    let built = if attachments.is_empty() {
        match content(&msg.body) {
            Content::Single(part) => builder.singlepart(part),
            Content::Multi(part) => builder.multipart(part),
        }
    } else {
        let mixed = match content(&msg.body) {
            Content::Single(part) => MultiPart::mixed().singlepart(part),
            Content::Multi(part) => MultiPart::mixed().multipart(part),
        };
        builder.multipart(attachments.into_iter().fold(mixed, MultiPart::singlepart))
    };

    built.map_err(|e| DispatchError::Build(e.to_string()))
}

/// Build an async SMTP transport from the given configuration.
fn build_transport(
    config: &SmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
    let builder = match config.security {
        SecurityMode::None => {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        SecurityMode::StartTls => {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| DispatchError::Configuration(format!("SMTP STARTTLS relay error: {e}")))?
        }
        SecurityMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| DispatchError::Configuration(format!("SMTP TLS relay error: {e}")))?,
    };

    let builder = builder.port(config.port);

    let builder = if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder.credentials(Credentials::new(user.clone(), pass.clone()))
    } else {
        builder
    };

    let builder = match config.timeout() {
        Some(timeout) => builder.timeout(Some(timeout)),
        None => builder,
    };

    Ok(builder.build())
}

/// Map a lettre SMTP error to the appropriate `DispatchError` variant.
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> DispatchError {
    let message = error.to_string();

    if error.is_transient() {
        DispatchError::Transient(message)
    } else if error.is_permanent() {
        DispatchError::Permanent(message)
    } else {
        DispatchError::Connection(message)
    }
}
