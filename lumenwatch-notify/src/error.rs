//! Error types for notification dispatch.

use lumenwatch_types::MalformedSample;
use serde::Serialize;
use thiserror::Error;

/// Diagnostic payload reported by a mail transport.
///
/// Mirrors what mail transports typically expose: a short error code
/// (e.g. `EAUTH`), the protocol command that failed (e.g. `AUTH`, `DATA`)
/// and the raw server response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}

/// Errors that can occur while dispatching a notification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// Sender, recipient or transport settings are missing or invalid.
    #[error("Invalid notification configuration ({field}): {reason}")]
    Configuration { field: &'static str, reason: String },

    /// The transport is unreachable or rejected the credentials.
    #[error("Transport verification failed: {0}")]
    Verification(TransportFailure),

    /// The transport accepted the session but the send attempt failed.
    #[error("Delivery failed: {0}")]
    Delivery(TransportFailure),

    /// The sample that triggered the dispatch was not a usable number.
    #[error("Malformed sample: {0}")]
    MalformedSample(#[from] MalformedSample),
}

impl DispatchError {
    pub fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        DispatchError::Configuration {
            field,
            reason: reason.into(),
        }
    }

    /// Stable name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Configuration { .. } => "configuration",
            DispatchError::Verification(_) => "verification",
            DispatchError::Delivery(_) => "delivery",
            DispatchError::MalformedSample(_) => "malformed_sample",
        }
    }

    /// Transport diagnostics, when the failure came from the transport.
    pub fn transport_failure(&self) -> Option<&TransportFailure> {
        match self {
            DispatchError::Verification(f) | DispatchError::Delivery(f) => Some(f),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.transport_failure().and_then(|f| f.code.as_deref())
    }

    pub fn command(&self) -> Option<&str> {
        self.transport_failure().and_then(|f| f.command.as_deref())
    }

    pub fn response(&self) -> Option<&str> {
        self.transport_failure().and_then(|f| f.response.as_deref())
    }
}
