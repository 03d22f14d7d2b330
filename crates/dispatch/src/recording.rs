//! Backend that records every message instead of sending it.
//!
//! Useful for testing code that drives a
//! [`MessageDispatcher`](crate::MessageDispatcher) without an SMTP server.
//! Individual addresses can be scripted to be rejected or to fault.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::{Delivery, EmailBackend, EmailMessage};
use crate::error::DispatchError;

/// Scripted behaviour for one recipient address.
#[derive(Debug, Clone)]
enum Script {
    Reject(String),
    Fault(String),
}

/// A backend that records all messages for later verification.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<EmailMessage>>>,
    call_count: AtomicUsize,
    scripts: HashMap<String, Script>,
    healthy: bool,
}

impl RecordingBackend {
    /// Create a backend that accepts every message.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            call_count: AtomicUsize::new(0),
            scripts: HashMap::new(),
            healthy: true,
        }
    }

    /// Fault every delivery to `address` with a connection error.
    #[must_use]
    pub fn fail_for(self, address: impl Into<String>) -> Self {
        self.fail_with(address, "connection refused")
    }

    /// Fault every delivery to `address` with the given connection error
    /// text.
    #[must_use]
    pub fn fail_with(mut self, address: impl Into<String>, error: impl Into<String>) -> Self {
        self.scripts
            .insert(address.into(), Script::Fault(error.into()));
        self
    }

    /// Answer every delivery to `address` with a negative server response.
    #[must_use]
    pub fn reject_for(mut self, address: impl Into<String>) -> Self {
        self.scripts.insert(
            address.into(),
            Script::Reject("550 mailbox unavailable".to_owned()),
        );
        self
    }

    /// Make [`EmailBackend::health_check`] fail.
    #[must_use]
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Shared handle to the recorded messages. Stays valid after the
    /// backend has been moved into a dispatcher.
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<EmailMessage>>> {
        Arc::clone(&self.calls)
    }

    /// Snapshot of the recorded messages.
    pub fn calls(&self) -> Vec<EmailMessage> {
        self.calls.lock().clone()
    }

    /// Number of `send` calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailBackend for RecordingBackend {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, DispatchError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(message.clone());

        match self.scripts.get(&message.to) {
            None => Ok(Delivery::Accepted {
                response: Some("250 OK".to_owned()),
            }),
            Some(Script::Reject(reason)) => Ok(Delivery::Rejected {
                reason: reason.clone(),
            }),
            Some(Script::Fault(error)) => Err(DispatchError::Connection(error.clone())),
        }
    }

    async fn health_check(&self) -> Result<(), DispatchError> {
        if self.healthy {
            Ok(())
        } else {
            Err(DispatchError::Connection("recording backend is unhealthy".to_owned()))
        }
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}
