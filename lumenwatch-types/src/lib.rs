//! # lumenwatch-types
//!
//! Core types shared by the lumenwatch crates: validated readings, samples,
//! threshold events, window statistics and the export consumed by dashboards.
//!
//! ## Features
//!
//! - `std` (default): Standard library support (wall-clock timestamps, `Error` impls)
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use lumenwatch_types::{LightStatus, Reading, Sample};
//!
//! let reading = Reading::new(1750.0).unwrap();
//! let sample = Sample::new(1_700_000_000_000, reading);
//!
//! assert_eq!(sample.value.get(), 1750.0);
//! assert_eq!(LightStatus::from_value(reading.get()), LightStatus::Moderate);
//!
//! // Non-finite values never become readings
//! assert!(Reading::new(f64::NAN).is_err());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod event;
mod export;
mod reading;
mod stats;

pub use event::*;
pub use export::*;
pub use reading::*;
pub use stats::*;

/// Format version written into every [`WindowExport`].
///
/// Bump on any change that renames, removes or re-types an export field.
pub const EXPORT_VERSION: u32 = 1;

/// Current wall-clock time as Unix milliseconds.
#[cfg(feature = "std")]
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
