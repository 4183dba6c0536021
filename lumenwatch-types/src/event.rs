//! Detector states and the edge events produced on state transitions.

use crate::Reading;

/// Where the channel sits relative to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectorState {
    /// No sample observed yet.
    #[default]
    Unknown,
    AboveOrEqual,
    Below,
}

impl DetectorState {
    /// Classify a value against a threshold.
    pub fn classify(value: f64, threshold: f64) -> Self {
        if value < threshold {
            DetectorState::Below
        } else {
            DetectorState::AboveOrEqual
        }
    }

    /// Short symbol for logs and status lines.
    pub fn symbol(&self) -> &'static str {
        match self {
            DetectorState::Unknown => "?",
            DetectorState::AboveOrEqual => "OK",
            DetectorState::Below => "LOW",
        }
    }
}

/// Downward crossing: the value went from at-or-above the threshold to below it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossingEvent {
    pub previous_value: Reading,
    pub new_value: Reading,
    pub threshold: f64,
    /// Unix timestamp in milliseconds of the sample that crossed.
    pub timestamp_ms: u64,
}

/// Upward crossing: the value went from below the threshold back to at-or-above it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecoveryEvent {
    pub previous_value: Reading,
    pub new_value: Reading,
    pub threshold: f64,
    pub timestamp_ms: u64,
}

/// Any edge event a detector can emit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ThresholdEvent {
    Crossing(CrossingEvent),
    Recovery(RecoveryEvent),
}

impl ThresholdEvent {
    /// The crossing, if this is one.
    pub fn as_crossing(&self) -> Option<&CrossingEvent> {
        match self {
            ThresholdEvent::Crossing(c) => Some(c),
            ThresholdEvent::Recovery(_) => None,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        match self {
            ThresholdEvent::Crossing(c) => c.timestamp_ms,
            ThresholdEvent::Recovery(r) => r.timestamp_ms,
        }
    }

    /// State the channel is in after this event.
    pub fn resulting_state(&self) -> DetectorState {
        match self {
            ThresholdEvent::Crossing(_) => DetectorState::Below,
            ThresholdEvent::Recovery(_) => DetectorState::AboveOrEqual,
        }
    }
}
