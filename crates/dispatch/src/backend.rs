use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::DispatchError;

/// Message body, either HTML or plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Plain-text body sent as `text/plain`.
    Text(String),
    /// HTML body, optionally accompanied by a plain-text alternative.
    Html {
        html: String,
        alt_text: Option<String>,
    },
}

/// A single-recipient message handed to a backend.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Sender email address.
    pub from: String,
    /// Optional sender display name.
    pub from_name: Option<String>,
    /// The one recipient this delivery attempt is for.
    pub to: String,
    /// Optional CC address.
    pub cc: Option<String>,
    /// Optional BCC address.
    pub bcc: Option<String>,
    /// Email subject line.
    pub subject: String,
    /// Message content.
    pub body: Body,
    /// Files to attach, in order.
    pub attachments: Vec<PathBuf>,
}

/// What the server said about a delivery attempt that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The server accepted the message.
    Accepted {
        /// Server response text, if any.
        response: Option<String>,
    },
    /// The server answered but did not accept the message.
    Rejected {
        /// Server response text.
        reason: String,
    },
}

/// Trait for pluggable email delivery backends.
///
/// A backend performs exactly one delivery attempt per call and must not
/// keep connections alive between calls. The
/// [`MessageDispatcher`](crate::dispatcher::MessageDispatcher) owns the
/// loop over recipients and the bookkeeping of outcomes.
#[async_trait]
pub trait EmailBackend: Send + Sync + std::fmt::Debug {
    /// Deliver one message. `Err` means the attempt faulted, either before
    /// a server answer (refused connection) or with an SMTP error status.
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, DispatchError>;

    /// Perform a health check to verify the backend is reachable.
    async fn health_check(&self) -> Result<(), DispatchError>;

    /// Return the backend name (e.g. `"smtp"`).
    fn backend_name(&self) -> &'static str;
}
