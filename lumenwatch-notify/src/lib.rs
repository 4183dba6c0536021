//! # lumenwatch-notify
//!
//! Turns threshold crossings into outbound mail.
//!
//! The mail transport is a capability injected into the
//! [`NotificationDispatcher`]: anything implementing [`MailTransport`]
//! (`verify` + `send`) can carry the messages. Two transports ship here:
//!
//! - [`MemoryTransport`] - records messages in process; can be scripted to
//!   fail, which makes it the test and dry-run transport
//! - `RelayTransport` (`relay` feature) - posts messages to an HTTP mail relay
//!
//! Dispatch performs exactly one delivery attempt. Failures come back as a
//! [`DispatchError`] carrying the transport's code, command and raw response
//! so callers can decide on their own retry policy.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use lumenwatch_notify::{MailSettings, MemoryTransport, NotificationDispatcher};
//! use lumenwatch_types::{CrossingEvent, Reading};
//!
//! # tokio_test::block_on(async {
//! let transport = Arc::new(MemoryTransport::new());
//! let settings = MailSettings::new("alerts@example.com", "ops@example.com");
//! let dispatcher = NotificationDispatcher::new(transport.clone(), settings).unwrap();
//!
//! let event = CrossingEvent {
//!     previous_value: Reading::new(1850.0).unwrap(),
//!     new_value: Reading::new(1750.0).unwrap(),
//!     threshold: 1800.0,
//!     timestamp_ms: 1_700_000_000_000,
//! };
//!
//! let result = dispatcher.notify_crossing(&event).await.unwrap();
//! assert!(result.success);
//! assert_eq!(transport.sent().len(), 1);
//! # });
//! ```

pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod template;
pub mod transport;

#[cfg(feature = "relay")]
pub mod relay;

pub use dispatcher::{DiagnosticReport, DispatchResult, MailSettings, NotificationDispatcher};
pub use error::{DispatchError, TransportFailure};
pub use memory::MemoryTransport;
pub use transport::{MailMessage, MailTransport, SendInfo};

#[cfg(feature = "relay")]
pub use relay::{RelayTransport, RelayTransportBuilder};
