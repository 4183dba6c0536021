//! HTTP mail relay transport.
//!
//! Talks to a relay service that accepts messages over HTTP and forwards
//! them to the mail system:
//!
//! - `GET {endpoint}/health` verifies reachability and credentials
//! - `POST {endpoint}/send` submits one [`MailMessage`] as JSON
//!
//! Both requests use HTTP basic auth.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lumenwatch_notify::RelayTransport;
//! use lumenwatch_notify::MailTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = RelayTransport::builder()
//!         .endpoint("http://localhost:8025")
//!         .credentials("alerts", "app-password")
//!         .build()?;
//!
//!     transport.verify().await?;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use lumenwatch_types::current_timestamp_ms;

use crate::{DispatchError, MailMessage, MailTransport, SendInfo, TransportFailure};

const DEFAULT_ENDPOINT: &str = "http://localhost:8025";

/// Mail transport backed by an HTTP relay.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    accepted: Arc<AtomicU64>,
}

impl RelayTransport {
    /// Create a new builder for configuring the transport.
    pub fn builder() -> RelayTransportBuilder {
        RelayTransportBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fallback_message_id(&self) -> String {
        let seq = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        format!("<{}.{}@lumenwatch.relay>", seq, current_timestamp_ms())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl MailTransport for RelayTransport {
    async fn verify(&self) -> Result<(), TransportFailure> {
        let response = self
            .client
            .get(self.url("health"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| request_failure(e, "CONN"))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint = %self.endpoint, "Relay verified");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_failure(status, body, "CONN"))
    }

    async fn send(&self, message: &MailMessage) -> Result<SendInfo, TransportFailure> {
        let response = self
            .client
            .post(self.url("send"))
            .basic_auth(&self.username, Some(&self.password))
            .json(message)
            .send()
            .await
            .map_err(|e| request_failure(e, "DATA"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_failure(status, body, "DATA"));
        }

        // 2xx means the relay owns the message now; a body we cannot read
        // must not turn into a failure the caller might retry.
        let header_id = response
            .headers()
            .get("message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<RelayAccepted>(&body) {
            Ok(accepted) => Ok(SendInfo {
                message_id: accepted.message_id,
                response: accepted.response.unwrap_or_else(|| status.to_string()),
            }),
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    "Relay accepted message with unreadable body: {}",
                    e
                );
                Ok(SendInfo {
                    message_id: header_id.unwrap_or_else(|| self.fallback_message_id()),
                    response: status.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "relay"
    }
}

/// Builder for [`RelayTransport`].
#[derive(Debug, Default)]
pub struct RelayTransportBuilder {
    endpoint: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
}

impl RelayTransportBuilder {
    /// Set the relay base URL (e.g., "http://localhost:8025").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the username and password for authentication.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<RelayTransport, DispatchError> {
        let username = self.username.unwrap_or_default();
        if username.trim().is_empty() {
            return Err(DispatchError::configuration(
                "user",
                "relay credentials are missing",
            ));
        }

        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::configuration("endpoint", e.to_string()))?;

        Ok(RelayTransport {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            username,
            password: self.password.unwrap_or_default(),
            accepted: Arc::new(AtomicU64::new(0)),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayAccepted {
    message_id: String,
    #[serde(default)]
    response: Option<String>,
}

fn request_failure(err: reqwest::Error, command: &str) -> TransportFailure {
    let code = if err.is_timeout() {
        "ETIMEDOUT"
    } else if err.is_connect() {
        "ECONNECTION"
    } else {
        "EREQUEST"
    };
    TransportFailure::new(err.to_string())
        .code(code)
        .command(command)
}

fn status_failure(status: StatusCode, body: String, command: &str) -> TransportFailure {
    let failure = if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        TransportFailure::new("Invalid credentials")
            .code("EAUTH")
            .command("AUTH")
    } else {
        TransportFailure::new(format!("Relay returned status {}", status))
            .code("EMESSAGE")
            .command(command)
    };

    let response = if body.is_empty() {
        status.to_string()
    } else {
        format!("{} {}", status.as_u16(), body.trim())
    };
    failure.response(response)
}
