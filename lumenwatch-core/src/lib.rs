//! # lumenwatch-core
//!
//! The stateful heart of lumenwatch: an edge-triggered threshold detector and
//! a bounded rolling aggregator for one sensor channel.
//!
//! ## Quick Start
//!
//! ```rust
//! use lumenwatch_core::{ChannelMonitor, MonitorConfig};
//! use lumenwatch_types::{Reading, SampleUpdate};
//!
//! let monitor = ChannelMonitor::new(MonitorConfig::new("sensors/light", 1800.0, 3)).unwrap();
//!
//! let first = SampleUpdate::new(None, Reading::new(1850.0).unwrap(), 1);
//! assert!(monitor.ingest(first).is_none()); // no baseline yet
//!
//! let second = SampleUpdate::new(None, Reading::new(1750.0).unwrap(), 2);
//! let event = monitor.ingest(second).unwrap();
//! assert!(event.as_crossing().is_some());
//!
//! let third = SampleUpdate::new(None, Reading::new(1700.0).unwrap(), 3);
//! assert!(monitor.ingest(third).is_none()); // still below: edge-triggered
//! ```
//!
//! ## Concurrency
//!
//! - [`CrossingDetector`] performs its read-then-transition inside one mutex
//!   critical section, so two overlapping updates can never both fire for
//!   the same crossing.
//! - [`RollingAggregator`] clones its window under a read lock; readers never
//!   observe a half-evicted window.
//! - [`ChannelMonitor::ingest`] serializes the detector step and the window
//!   push, so window order always matches detection order.
//! - All three are `Send + Sync` and meant to be shared behind an `Arc`.

mod aggregator;
mod decode;
mod detector;
mod error;
mod monitor;

pub use aggregator::{RollingAggregator, WindowSnapshot};
pub use decode::SampleDecoder;
pub use detector::{evaluate, transition, CrossingDetector};
pub use error::{AggregatorError, MonitorError};
pub use monitor::{ChannelMonitor, MonitorConfig};

// Re-export types for convenience
pub use lumenwatch_types::{
    CrossingEvent, DetectorState, Domain, LightStatus, MalformedSample, Reading, RecoveryEvent,
    Sample, SampleUpdate, Statistics, ThresholdEvent, WindowExport,
};
