//! In-process mail transport.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use lumenwatch_types::current_timestamp_ms;

use crate::{MailMessage, MailTransport, SendInfo, TransportFailure};

/// Records messages instead of delivering them.
///
/// Failures can be scripted with [`fail_verify`](Self::fail_verify) and
/// [`fail_send`](Self::fail_send). Used by tests and by `--dry-run`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<MailMessage>>,
    verify_failure: Option<TransportFailure>,
    send_failure: Option<TransportFailure>,
    delay: Option<Duration>,
    verify_calls: AtomicU64,
    send_attempts: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `verify` call fail with `failure`.
    pub fn fail_verify(mut self, failure: TransportFailure) -> Self {
        self.verify_failure = Some(failure);
        self
    }

    /// Make every `send` call fail with `failure`.
    pub fn fail_send(mut self, failure: TransportFailure) -> Self {
        self.send_failure = Some(failure);
        self
    }

    /// Sleep this long inside `send`, to stand in for a slow server.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    pub fn verify_calls(&self) -> u64 {
        self.verify_calls.load(Ordering::Relaxed)
    }

    pub fn send_attempts(&self) -> u64 {
        self.send_attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn verify(&self) -> Result<(), TransportFailure> {
        self.verify_calls.fetch_add(1, Ordering::Relaxed);
        match &self.verify_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn send(&self, message: &MailMessage) -> Result<SendInfo, TransportFailure> {
        let attempt = self.send_attempts.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = &self.send_failure {
            return Err(failure.clone());
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Recorded message");
        self.sent.lock().push(message.clone());

        Ok(SendInfo {
            message_id: format!("<{}.{}@lumenwatch.memory>", attempt, current_timestamp_ms()),
            response: "250 2.0.0 OK".to_string(),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> MailMessage {
        MailMessage {
            from: "a@b.c".to_string(),
            to: "d@e.f".to_string(),
            subject: "hello".to_string(),
            html: "<p>hi</p>".to_string(),
            text: "hi".to_string(),
        }
    }

    #[tokio::test]
    async fn records_messages() {
        let transport = MemoryTransport::new();
        transport.verify().await.unwrap();
        let info = transport.send(&message()).await.unwrap();

        assert!(info.message_id.starts_with("<1."));
        assert!(info.message_id.ends_with("@lumenwatch.memory>"));
        assert_eq!(transport.sent(), vec![message()]);
        assert_eq!(transport.verify_calls(), 1);
    }

    #[tokio::test]
    async fn scripted_send_failure_records_nothing() {
        let transport = MemoryTransport::new().fail_send(TransportFailure::new("boom"));
        let err = transport.send(&message()).await.unwrap_err();
        assert_eq!(err.message, "boom");
        assert_eq!(transport.send_attempts(), 1);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied() {
        let transport = MemoryTransport::new().with_delay(Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        transport.send(&message()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
