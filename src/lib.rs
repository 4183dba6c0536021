//! # lumenwatch
//!
//! Low-light alerting for one IoT light sensor.
//!
//! Samples arrive from a [`SampleSource`], pass through a
//! [`ChannelMonitor`](lumenwatch_core::ChannelMonitor) (edge-triggered
//! detector plus rolling window) and, when the level drops below the
//! threshold, a notification is handed to the
//! [`NotificationDispatcher`](lumenwatch_notify::NotificationDispatcher).
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────────────┐    ┌────────────┐
//! │ SampleSource │───▶│ ChannelMonitor             │───▶│ Dispatcher │──▶ mail
//! │ file | tcp | │    │  CrossingDetector (mutex)  │    │  (spawned) │
//! │ channel      │    │  RollingAggregator (rwlock)│    └────────────┘
//! └──────────────┘    └─────────────┬──────────────┘
//!                                   ▼
//!                           WindowExport (dashboard)
//! ```
//!
//! - **[`source`]**: the [`SampleSource`] trait with file, stream and
//!   channel implementations
//! - **[`pipeline`]**: [`AlertPipeline`] and the polling [`run`] loop
//! - **[`config`]**: layered [`Settings`] (file + environment)
//! - **[`export`]**: one-shot JSON export of the window
//!
//! ## Usage
//!
//! ```bash
//! # Watch a JSON file written by the sensor gateway
//! lumenwatch --file light.json
//!
//! # Read newline-delimited samples from a TCP gateway
//! lumenwatch --connect localhost:9090 --config lumenwatch.toml
//!
//! # Check mail delivery
//! lumenwatch --config lumenwatch.toml --diagnose
//! ```
//!
//! ## As a library
//!
//! ```
//! use std::sync::Arc;
//! use lumenwatch::{AlertPipeline, ChannelSource};
//! use lumenwatch_core::{ChannelMonitor, MonitorConfig};
//! use lumenwatch_notify::{MailSettings, MemoryTransport, NotificationDispatcher};
//!
//! # tokio_test::block_on(async {
//! let monitor = Arc::new(ChannelMonitor::new(MonitorConfig::new("sensors/light", 1800.0, 30)).unwrap());
//! let dispatcher = Arc::new(
//!     NotificationDispatcher::new(
//!         Arc::new(MemoryTransport::new()),
//!         MailSettings::new("alerts@example.com", "ops@example.com"),
//!     )
//!     .unwrap(),
//! );
//! let (pipeline, outcomes) = AlertPipeline::new(monitor, dispatcher);
//! let (tx, source) = ChannelSource::create("gateway");
//! # });
//! ```

pub mod config;
pub mod export;
pub mod pipeline;
pub mod source;

pub use config::{ConfigError, MailConfig, Overrides, Settings};
pub use export::{export_to_file, ExportError};
pub use pipeline::{drain, run, run_until, AlertPipeline, DispatchOutcome};
pub use source::{ChannelSource, FileSource, Polled, SampleSource, StreamSource};
