use serde::Serialize;

use crate::locale::LocaleMessages;

/// Overall status of a `send()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Every recipient was accepted.
    #[default]
    Ok,
    /// There were no recipients, or at least one recipient failed.
    Error,
}

impl DispatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// The result of the delivery attempt to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecipientOutcome {
    /// The server accepted the message.
    Sent {
        address: String,
        response: Option<String>,
    },
    /// The server answered but refused the message.
    Rejected { address: String, reason: String },
    /// The attempt faulted before a usable answer.
    Failed { address: String, error: String },
}

impl RecipientOutcome {
    pub fn address(&self) -> &str {
        match self {
            Self::Sent { address, .. }
            | Self::Rejected { address, .. }
            | Self::Failed { address, .. } => address,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Aggregate result of one `send()` call.
///
/// `status` and `message` mirror the classic `{status, message}` pair;
/// `outcomes` holds one entry per attempted recipient, in order, and only
/// covers this call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub status: DispatchStatus,
    pub message: String,
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchReport {
    /// The report for a dispatcher with nobody to send to.
    pub fn no_recipients(messages: &LocaleMessages) -> Self {
        Self {
            status: DispatchStatus::Error,
            message: messages.no_recipients.clone(),
            outcomes: Vec::new(),
        }
    }

    /// Add one recipient's outcome, updating status and message.
    pub fn record(&mut self, outcome: RecipientOutcome, messages: &LocaleMessages) {
        let prefix = &messages.error_sending;
        match &outcome {
            RecipientOutcome::Sent { .. } => {}
            RecipientOutcome::Rejected { address, .. } => {
                self.status = DispatchStatus::Error;
                self.message.push_str(&format!("{prefix}{address} - "));
            }
            RecipientOutcome::Failed { address, error } => {
                self.status = DispatchStatus::Error;
                self.message
                    .push_str(&format!("{prefix}{address} - Error: {error} - "));
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn is_ok(&self) -> bool {
        self.status == DispatchStatus::Ok
    }

    /// Addresses accepted during this call.
    pub fn sent(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_sent())
            .map(RecipientOutcome::address)
    }

    /// Addresses that failed during this call.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_sent())
            .map(RecipientOutcome::address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> LocaleMessages {
        LocaleMessages::new("There are no recipients!", "Error sending the email to: ")
    }

    #[test]
    fn empty_report_is_ok() {
        let report = DispatchReport::default();
        assert!(report.is_ok());
        assert!(report.message.is_empty());
    }

    #[test]
    fn no_recipients_report() {
        let report = DispatchReport::no_recipients(&english());
        assert_eq!(report.status, DispatchStatus::Error);
        assert_eq!(report.message, "There are no recipients!");
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn sent_outcomes_keep_status_ok() {
        let mut report = DispatchReport::default();
        report.record(
            RecipientOutcome::Sent {
                address: "a@x.com".into(),
                response: Some("250 OK".into()),
            },
            &english(),
        );
        assert!(report.is_ok());
        assert!(report.message.is_empty());
        assert_eq!(report.sent().collect::<Vec<_>>(), ["a@x.com"]);
    }

    #[test]
    fn failures_build_message_fragments() {
        let mut report = DispatchReport::default();
        let messages = english();
        report.record(
            RecipientOutcome::Rejected {
                address: "a@x.com".into(),
                reason: "452 try later".into(),
            },
            &messages,
        );
        report.record(
            RecipientOutcome::Sent {
                address: "b@x.com".into(),
                response: None,
            },
            &messages,
        );
        report.record(
            RecipientOutcome::Failed {
                address: "c@x.com".into(),
                error: "connection refused".into(),
            },
            &messages,
        );

        assert_eq!(report.status, DispatchStatus::Error);
        assert_eq!(
            report.message,
            "Error sending the email to: a@x.com - \
             Error sending the email to: c@x.com - Error: connection refused - "
        );
        assert_eq!(report.sent().collect::<Vec<_>>(), ["b@x.com"]);
        assert_eq!(report.failed().collect::<Vec<_>>(), ["a@x.com", "c@x.com"]);
    }

    #[test]
    fn report_serializes_status_and_outcomes() {
        let mut report = DispatchReport::default();
        report.record(
            RecipientOutcome::Failed {
                address: "b@x.com".into(),
                error: "boom".into(),
            },
            &english(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["outcomes"][0]["outcome"], "failed");
        assert_eq!(json["outcomes"][0]["address"], "b@x.com");
        assert_eq!(json["outcomes"][0]["error"], "boom");
    }

    #[test]
    fn status_strings() {
        assert_eq!(DispatchStatus::Ok.as_str(), "ok");
        assert_eq!(DispatchStatus::Error.as_str(), "error");
    }
}
