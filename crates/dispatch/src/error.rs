use thiserror::Error;

/// Errors that can occur while preparing or delivering a message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatcher or transport was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A sender, recipient, CC or BCC address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// An attachment could not be read from disk.
    #[error("cannot attach {path}: {reason}")]
    Attachment {
        /// Path of the attachment as given by the caller.
        path: String,
        /// Underlying I/O failure.
        reason: String,
    },

    /// The message could not be assembled.
    #[error("failed to build email: {0}")]
    Build(String),

    /// A network or TLS level error occurred while talking to the server.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with a transient (4xx) failure.
    #[error("transient SMTP error: {0}")]
    Transient(String),

    /// The server answered with a permanent (5xx) failure.
    #[error("permanent SMTP error: {0}")]
    Permanent(String),
}

impl DispatchError {
    /// Returns `true` if the error is transient and a later attempt may
    /// succeed.
    ///
    /// The dispatcher never retries on its own; this is information for
    /// callers that want to schedule a second pass over `result_error`.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(DispatchError::Connection("refused".into()).is_transient());
        assert!(DispatchError::Transient("421 busy".into()).is_transient());
    }

    #[test]
    fn non_transient_errors() {
        assert!(!DispatchError::Configuration("x".into()).is_transient());
        assert!(!DispatchError::InvalidAddress("x".into()).is_transient());
        assert!(!DispatchError::Build("x".into()).is_transient());
        assert!(!DispatchError::Permanent("550".into()).is_transient());
        assert!(
            !DispatchError::Attachment {
                path: "a.pdf".into(),
                reason: "missing".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn error_display() {
        let err = DispatchError::Attachment {
            path: "/tmp/report.pdf".into(),
            reason: "No such file or directory".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot attach /tmp/report.pdf: No such file or directory"
        );

        let err = DispatchError::Permanent("550 mailbox unavailable".into());
        assert_eq!(
            err.to_string(),
            "permanent SMTP error: 550 mailbox unavailable"
        );
    }
}
