use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backend::{Body, Delivery, EmailBackend, EmailMessage};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::locale::{Catalog, LocaleMessages};
use crate::report::{DispatchReport, RecipientOutcome};
use crate::smtp::SmtpBackend;

/// Collects the state of one outbound message and sends it to every
/// recipient separately.
///
/// Each recipient gets its own message (with the shared CC/BCC, subject,
/// body and attachments) and exactly one delivery attempt. A failure for
/// one recipient never stops the loop.
///
/// `result_ok` and `result_error` keep accumulating across `send()` calls
/// until the caller clears them. The [`DispatchReport`] returned by
/// `send()` only describes that call.
///
/// # Examples
///
/// ```no_run
/// use courier_dispatch::{DispatchConfig, MessageDispatcher, SmtpConfig};
///
/// # async fn run() -> Result<(), courier_dispatch::DispatchError> {
/// let config = DispatchConfig::new(
///     SmtpConfig::new("smtp.example.com").with_credentials("user", "pass"),
/// )
/// .with_language("en");
/// let mut dispatcher = MessageDispatcher::smtp(&config)?;
/// dispatcher.set_from("noreply@example.com", Some("Example".to_owned()));
/// dispatcher.add_recipient("a@example.com");
/// dispatcher.set_subject("Hello");
/// dispatcher.set_message("<p>Hi!</p>");
///
/// let report = dispatcher.send().await;
/// println!("{}: {}", report.status.as_str(), report.message);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MessageDispatcher {
    backend: Box<dyn EmailBackend>,
    debug: bool,
    language: String,
    messages: LocaleMessages,

    recipients: Vec<String>,
    cc: Option<String>,
    bcc: Option<String>,
    subject: String,
    message: String,
    alt_message: Option<String>,
    is_html: bool,
    from: String,
    from_name: Option<String>,
    attachments: Vec<PathBuf>,

    result_ok: Vec<String>,
    result_error: Vec<String>,
}

impl MessageDispatcher {
    /// Create a dispatcher that delivers through `backend`.
    ///
    /// Fails with [`DispatchError::Configuration`] when the configured
    /// language has no usable message table.
    pub fn new(
        config: &DispatchConfig,
        backend: Box<dyn EmailBackend>,
    ) -> Result<Self, DispatchError> {
        let catalog = Catalog::with_overrides(&config.locales);
        let messages = catalog.resolve(&config.language)?.clone();
        Ok(Self {
            backend,
            debug: config.debug,
            language: config.language.clone(),
            messages,
            recipients: Vec::new(),
            cc: None,
            bcc: None,
            subject: String::new(),
            message: String::new(),
            alt_message: None,
            is_html: true,
            from: String::new(),
            from_name: None,
            attachments: Vec::new(),
            result_ok: Vec::new(),
            result_error: Vec::new(),
        })
    }

    /// Create a dispatcher that delivers over SMTP using `config.smtp`.
    pub fn smtp(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let backend = SmtpBackend::new(config.smtp.clone())?;
        Self::new(config, Box::new(backend))
    }

    pub fn backend(&self) -> &dyn EmailBackend {
        self.backend.as_ref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_recipients<I, S>(&mut self, recipients: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients = recipients.into_iter().map(Into::into).collect();
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn add_recipient(&mut self, recipient: impl Into<String>) {
        self.recipients.push(recipient.into());
    }

    pub fn set_cc(&mut self, cc: impl Into<String>) {
        self.cc = Some(cc.into());
    }

    pub fn cc(&self) -> Option<&str> {
        self.cc.as_deref()
    }

    pub fn set_bcc(&mut self, bcc: impl Into<String>) {
        self.bcc = Some(bcc.into());
    }

    pub fn bcc(&self) -> Option<&str> {
        self.bcc.as_deref()
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Set the message content, interpreted as HTML or plain text depending
    /// on [`set_is_html`](Self::set_is_html).
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Plain-text alternative sent next to an HTML message. Ignored for
    /// plain-text messages.
    pub fn set_alt_message(&mut self, alt: impl Into<String>) {
        self.alt_message = Some(alt.into());
    }

    pub fn alt_message(&self) -> Option<&str> {
        self.alt_message.as_deref()
    }

    /// Whether the message content is HTML. Defaults to `true`.
    pub fn set_is_html(&mut self, is_html: bool) {
        self.is_html = is_html;
    }

    pub fn is_html(&self) -> bool {
        self.is_html
    }

    /// Set the sender address. The display name is only replaced when
    /// `name` is `Some`.
    pub fn set_from(&mut self, from: impl Into<String>, name: Option<String>) {
        self.from = from.into();
        if name.is_some() {
            self.from_name = name;
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn set_from_name(&mut self, name: impl Into<String>) {
        self.from_name = Some(name.into());
    }

    pub fn from_name(&self) -> Option<&str> {
        self.from_name.as_deref()
    }

    pub fn set_attachments<I, P>(&mut self, attachments: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.attachments = attachments.into_iter().map(Into::into).collect();
    }

    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, path: impl AsRef<Path>) {
        self.attachments.push(path.as_ref().to_path_buf());
    }

    pub fn set_result_ok(&mut self, addresses: Vec<String>) {
        self.result_ok = addresses;
    }

    /// Every address accepted so far, across all `send()` calls.
    pub fn result_ok(&self) -> &[String] {
        &self.result_ok
    }

    pub fn add_result_ok(&mut self, address: impl Into<String>) {
        self.result_ok.push(address.into());
    }

    pub fn set_result_error(&mut self, addresses: Vec<String>) {
        self.result_error = addresses;
    }

    /// Every address that failed so far, across all `send()` calls.
    pub fn result_error(&self) -> &[String] {
        &self.result_error
    }

    pub fn add_result_error(&mut self, address: impl Into<String>) {
        self.result_error.push(address.into());
    }

    /// Forget the accumulated `result_ok` and `result_error` history.
    pub fn clear_results(&mut self) {
        self.result_ok.clear();
        self.result_error.clear();
    }

    fn body(&self) -> Body {
        if self.is_html {
            Body::Html {
                html: self.message.clone(),
                alt_text: self.alt_message.clone(),
            }
        } else {
            Body::Text(self.message.clone())
        }
    }

    fn message_for(&self, recipient: &str) -> EmailMessage {
        EmailMessage {
            from: self.from.clone(),
            from_name: self.from_name.clone(),
            to: recipient.to_owned(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            subject: self.subject.clone(),
            body: self.body(),
            attachments: self.attachments.clone(),
        }
    }

    /// Send the message to every recipient, one at a time.
    ///
    /// Never fails: problems are reported through the returned report and
    /// the `result_error` list.
    pub async fn send(&mut self) -> DispatchReport {
        if self.recipients.is_empty() {
            return DispatchReport::no_recipients(&self.messages);
        }

        let recipients = self.recipients.clone();
        if self.debug {
            debug!(
                backend = self.backend.backend_name(),
                "sending emails to {} addresses",
                recipients.len()
            );
        }

        let mut report = DispatchReport::default();
        for address in recipients {
            let message = self.message_for(&address);
            let outcome = match self.backend.send(&message).await {
                Ok(Delivery::Accepted { response }) => {
                    self.result_ok.push(address.clone());
                    if self.debug {
                        debug!("email sent to: {address}");
                    }
                    RecipientOutcome::Sent { address, response }
                }
                Ok(Delivery::Rejected { reason }) => {
                    self.result_error.push(address.clone());
                    if self.debug {
                        debug!(%reason, "error sending email to: {address}");
                    }
                    RecipientOutcome::Rejected { address, reason }
                }
                Err(e) => {
                    self.result_error.push(address.clone());
                    if self.debug {
                        debug!("error sending email to \"{address}\": {e}");
                    }
                    RecipientOutcome::Failed {
                        address,
                        error: e.to_string(),
                    }
                }
            };
            report.record(outcome, &self.messages);
        }

        report
    }
}
