//! Edge-triggered threshold detection.
//!
//! [`evaluate`] is the pure crossing rule. [`CrossingDetector`] holds the
//! per-channel state and applies the rule atomically.
//!
//! There is no hysteresis: a value oscillating across the threshold fires a
//! crossing on every downward step.

use parking_lot::Mutex;
use tracing::{debug, info};

use lumenwatch_types::{CrossingEvent, DetectorState, Reading, RecoveryEvent, ThresholdEvent};

/// Decide whether a downward crossing occurred.
///
/// Fires iff `previous >= threshold` and `new < threshold`. With no previous
/// value there is no baseline, so nothing fires.
pub fn evaluate(
    previous: Option<Reading>,
    new: Reading,
    threshold: f64,
    timestamp_ms: u64,
) -> Option<CrossingEvent> {
    let previous = previous?;
    if previous.get() >= threshold && new.get() < threshold {
        Some(CrossingEvent {
            previous_value: previous,
            new_value: new,
            threshold,
            timestamp_ms,
        })
    } else {
        None
    }
}

/// Like [`evaluate`], but also reports the upward (recovery) edge.
pub fn transition(
    previous: Option<Reading>,
    new: Reading,
    threshold: f64,
    timestamp_ms: u64,
) -> Option<ThresholdEvent> {
    if let Some(crossing) = evaluate(previous, new, threshold, timestamp_ms) {
        return Some(ThresholdEvent::Crossing(crossing));
    }

    let previous = previous?;
    if previous.get() < threshold && new.get() >= threshold {
        Some(ThresholdEvent::Recovery(RecoveryEvent {
            previous_value: previous,
            new_value: new,
            threshold,
            timestamp_ms,
        }))
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct DetectorInner {
    previous: Option<Reading>,
    state: DetectorState,
    observed: u64,
}

/// Per-channel detector state holder.
///
/// The threshold is fixed for the detector's lifetime. All state lives behind
/// a single mutex; [`observe`](Self::observe) reads the previous value, applies
/// the rule and stores the new value without releasing it, which is what makes
/// "exactly one event per crossing" hold under overlapping updates.
#[derive(Debug)]
pub struct CrossingDetector {
    threshold: f64,
    inner: Mutex<DetectorInner>,
}

impl CrossingDetector {
    /// Create a detector in the `Unknown` state.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            inner: Mutex::new(DetectorInner::default()),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Observe a new value and return the edge event it caused, if any.
    ///
    /// The baseline is the last value this detector accepted, never a value
    /// supplied by the caller.
    pub fn observe(&self, value: Reading, timestamp_ms: u64) -> Option<ThresholdEvent> {
        let mut inner = self.inner.lock();

        let event = transition(inner.previous, value, self.threshold, timestamp_ms);
        let next = DetectorState::classify(value.get(), self.threshold);

        if inner.state != next {
            debug!(
                from = inner.state.symbol(),
                to = next.symbol(),
                value = value.get(),
                "detector state changed"
            );
        }

        inner.previous = Some(value);
        inner.state = next;
        inner.observed += 1;

        if let Some(ThresholdEvent::Crossing(c)) = &event {
            info!(
                previous = c.previous_value.get(),
                value = c.new_value.get(),
                threshold = self.threshold,
                "value dropped below threshold"
            );
        }

        event
    }

    /// Current state.
    pub fn state(&self) -> DetectorState {
        self.inner.lock().state
    }

    /// Last accepted value.
    pub fn previous(&self) -> Option<Reading> {
        self.inner.lock().previous
    }

    /// Number of samples observed since creation or the last reset.
    pub fn observed(&self) -> u64 {
        self.inner.lock().observed
    }

    /// Forget the baseline and return to `Unknown`.
    pub fn reset(&self) {
        *self.inner.lock() = DetectorInner::default();
    }
}
