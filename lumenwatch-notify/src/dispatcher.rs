//! Crossing notification dispatch.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use lumenwatch_types::{current_timestamp_ms, CrossingEvent, RecoveryEvent};

use crate::template;
use crate::{DispatchError, MailMessage, MailTransport};

/// Default operating threshold quoted in the diagnostic message.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 1800.0;

/// Sender and recipient for outbound notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailSettings {
    pub from: String,
    pub recipient: String,
    /// Threshold mentioned in the diagnostic message body.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
}

fn default_alert_threshold() -> f64 {
    DEFAULT_ALERT_THRESHOLD
}

impl MailSettings {
    pub fn new(from: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            recipient: recipient.into(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }

    pub fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// Check that the sender and recipient can be used for delivery.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.from.trim().is_empty() {
            return Err(DispatchError::configuration("from", "sender must not be empty"));
        }
        let recipient = self.recipient.trim();
        if recipient.is_empty() {
            return Err(DispatchError::configuration(
                "recipient",
                "recipient must not be empty",
            ));
        }
        if !recipient.contains('@') {
            return Err(DispatchError::configuration(
                "recipient",
                format!("'{}' is not a mail address", recipient),
            ));
        }
        Ok(())
    }
}

/// Outcome of one accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub response: Option<String>,
    pub error_detail: Option<String>,
    pub timestamp_ms: u64,
}

/// Structured answer of the diagnostic entry point.
///
/// Always produced, whether the self-test succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl DiagnosticReport {
    fn from_result(result: Result<DispatchResult, DispatchError>) -> Self {
        match result {
            Ok(ok) => Self {
                success: true,
                message_id: ok.message_id,
                response: ok.response,
                timestamp: Some(iso_timestamp(ok.timestamp_ms)),
                error: None,
                code: None,
                command: None,
            },
            Err(err) => Self {
                success: false,
                message_id: None,
                response: err.response().map(str::to_string),
                timestamp: None,
                error: Some(err.to_string()),
                code: err.code().map(str::to_string),
                command: err.command().map(str::to_string),
            },
        }
    }
}

fn iso_timestamp(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Renders threshold events and hands them to a [`MailTransport`].
///
/// Holds no state between calls besides the transport handle and settings,
/// so one dispatcher can be shared across tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    settings: MailSettings,
}

impl NotificationDispatcher {
    /// Create a dispatcher, rejecting unusable settings up front.
    pub fn new(
        transport: Arc<dyn MailTransport>,
        settings: MailSettings,
    ) -> Result<Self, DispatchError> {
        settings.validate()?;
        Ok(Self {
            transport,
            settings,
        })
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Check transport reachability and credentials.
    pub async fn verify(&self) -> Result<(), DispatchError> {
        self.transport.verify().await.map_err(|failure| {
            tracing::warn!(
                transport = self.transport.name(),
                code = failure.code.as_deref().unwrap_or("-"),
                "Transport verification failed: {}",
                failure.message
            );
            DispatchError::Verification(failure)
        })
    }

    /// Send the low-light alert for one crossing.
    pub async fn notify_crossing(
        &self,
        event: &CrossingEvent,
    ) -> Result<DispatchResult, DispatchError> {
        let message = template::crossing(event, &self.settings.from, &self.settings.recipient);
        tracing::info!(
            previous = event.previous_value.get(),
            current = event.new_value.get(),
            threshold = event.threshold,
            "Dispatching low light alert"
        );
        self.deliver(message).await
    }

    /// Send the recovery notice for one upward transition.
    pub async fn notify_recovery(
        &self,
        event: &RecoveryEvent,
    ) -> Result<DispatchResult, DispatchError> {
        let message = template::recovery(event, &self.settings.from, &self.settings.recipient);
        tracing::info!(
            previous = event.previous_value.get(),
            current = event.new_value.get(),
            "Dispatching recovery notice"
        );
        self.deliver(message).await
    }

    /// Verify the transport and send the fixed self-test message.
    pub async fn send_diagnostic(&self) -> Result<DispatchResult, DispatchError> {
        let message = template::diagnostic(
            current_timestamp_ms(),
            self.settings.alert_threshold,
            &self.settings.from,
            &self.settings.recipient,
        );
        self.deliver(message).await
    }

    /// Run [`send_diagnostic`](Self::send_diagnostic) and fold the outcome
    /// into a report.
    pub async fn diagnostic_report(&self) -> DiagnosticReport {
        DiagnosticReport::from_result(self.send_diagnostic().await)
    }

    async fn deliver(&self, message: MailMessage) -> Result<DispatchResult, DispatchError> {
        self.verify().await?;

        match self.transport.send(&message).await {
            Ok(info) => {
                tracing::info!(
                    message_id = %info.message_id,
                    subject = %message.subject,
                    "Notification sent"
                );
                Ok(DispatchResult {
                    success: true,
                    message_id: Some(info.message_id),
                    response: Some(info.response),
                    error_detail: None,
                    timestamp_ms: current_timestamp_ms(),
                })
            }
            Err(failure) => {
                tracing::error!(
                    code = failure.code.as_deref().unwrap_or("-"),
                    command = failure.command.as_deref().unwrap_or("-"),
                    response = failure.response.as_deref().unwrap_or("-"),
                    "Failed to send notification: {}",
                    failure.message
                );
                Err(DispatchError::Delivery(failure))
            }
        }
    }
}
