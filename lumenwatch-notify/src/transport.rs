//! The mail transport capability.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::TransportFailure;

/// A fully rendered outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Rich rendering.
    pub html: String,
    /// Plain-text rendering of the same content.
    pub text: String,
}

/// What the transport reports after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendInfo {
    pub message_id: String,
    /// Raw transport response line, e.g. `250 2.0.0 OK`.
    pub response: String,
}

/// Anything that can carry a [`MailMessage`].
///
/// Implementations should make `send` all-or-nothing: on `Err` the message
/// must not have been handed off.
#[async_trait]
pub trait MailTransport: Send + Sync + Debug {
    /// Check reachability and credentials without sending anything.
    async fn verify(&self) -> Result<(), TransportFailure>;

    /// Make one delivery attempt.
    async fn send(&self, message: &MailMessage) -> Result<SendInfo, TransportFailure>;

    /// Human-readable transport name for logs.
    fn name(&self) -> &str;
}
