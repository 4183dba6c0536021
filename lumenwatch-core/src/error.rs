//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while constructing a rolling aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregatorError {
    /// Capacity must be at least one sample.
    #[error("Window capacity must be positive")]
    ZeroCapacity,

    /// Domain bounds are inverted or not finite.
    #[error("Invalid domain: min {min} must be below max {max}")]
    InvalidDomain { min: f64, max: f64 },
}

/// Errors raised while constructing a [`ChannelMonitor`](crate::ChannelMonitor).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    /// A NaN or infinite threshold would never compare as crossed.
    #[error("Threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),

    #[error(transparent)]
    Window(#[from] AggregatorError),
}
