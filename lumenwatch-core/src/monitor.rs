//! A single monitored channel: detector and aggregator fed by the same samples.

use parking_lot::Mutex;
use tracing::{debug, trace};

use lumenwatch_types::{
    DetectorState, Domain, SampleUpdate, Statistics, ThresholdEvent, WindowExport,
};

use crate::{CrossingDetector, MonitorError, RollingAggregator, WindowSnapshot};

/// Settings for one [`ChannelMonitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Channel path, e.g. `sensors/light`.
    pub channel: String,
    pub threshold: f64,
    /// Maximum samples kept in the rolling window.
    pub capacity: usize,
    pub domain: Domain,
}

impl MonitorConfig {
    pub fn new(channel: impl Into<String>, threshold: f64, capacity: usize) -> Self {
        Self {
            channel: channel.into(),
            threshold,
            capacity,
            domain: Domain::default(),
        }
    }

    /// Set the expected value domain (default 0..=4095).
    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }
}

/// Owns the detector and the aggregator for one channel.
///
/// Every sample goes to both. Concurrent `ingest` calls are serialized, so
/// the window holds samples in exactly the order the detector judged them.
/// Readers only take the window's read lock.
///
/// # Example
///
/// ```rust
/// use lumenwatch_core::{ChannelMonitor, MonitorConfig};
/// use lumenwatch_types::{Reading, SampleUpdate};
///
/// let monitor = ChannelMonitor::new(MonitorConfig::new("sensors/light", 1800.0, 3)).unwrap();
/// for (i, v) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
///     monitor.ingest(SampleUpdate::new(None, Reading::new(*v).unwrap(), i as u64));
/// }
///
/// let stats = monitor.statistics();
/// assert_eq!((stats.min, stats.max, stats.avg, stats.current), (20.0, 40.0, 30.0, 40.0));
/// ```
#[derive(Debug)]
pub struct ChannelMonitor {
    channel: String,
    detector: CrossingDetector,
    aggregator: RollingAggregator,
    /// Held across observe + push so the window order matches the order
    /// the detector saw.
    ingest_order: Mutex<()>,
}

impl ChannelMonitor {
    /// Build a monitor, rejecting a non-finite threshold or an unusable window.
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        if !config.threshold.is_finite() {
            return Err(MonitorError::InvalidThreshold(config.threshold));
        }
        let aggregator = RollingAggregator::new(config.capacity)?.with_domain(config.domain)?;
        Ok(Self {
            channel: config.channel,
            detector: CrossingDetector::new(config.threshold),
            aggregator,
            ingest_order: Mutex::new(()),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn threshold(&self) -> f64 {
        self.detector.threshold()
    }

    /// Feed one update to the detector and the window.
    ///
    /// Returns the edge event the update caused, if any.
    pub fn ingest(&self, update: SampleUpdate) -> Option<ThresholdEvent> {
        trace!(channel = %self.channel, value = update.value.get(), "ingest");

        if let (Some(reported), Some(held)) = (update.previous, self.detector.previous()) {
            if reported != held {
                debug!(
                    channel = %self.channel,
                    reported = reported.get(),
                    held = held.get(),
                    "source previous value differs from detector baseline"
                );
            }
        }

        let _order = self.ingest_order.lock();
        let event = self.detector.observe(update.value, update.timestamp_ms);
        self.aggregator.push(update.sample());
        event
    }

    pub fn state(&self) -> DetectorState {
        self.detector.state()
    }

    pub fn statistics(&self) -> Statistics {
        self.aggregator.statistics()
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.aggregator.snapshot()
    }

    /// Dashboard export for this channel.
    pub fn export(&self) -> WindowExport {
        self.aggregator.export(&self.channel, self.detector.threshold())
    }

    pub fn detector(&self) -> &CrossingDetector {
        &self.detector
    }

    pub fn aggregator(&self) -> &RollingAggregator {
        &self.aggregator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenwatch_types::Reading;

    fn update(v: f64, ts: u64) -> SampleUpdate {
        SampleUpdate::new(None, Reading::new(v).unwrap(), ts)
    }

    fn monitor() -> ChannelMonitor {
        ChannelMonitor::new(MonitorConfig::new("sensors/light", 1800.0, 30)).unwrap()
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = ChannelMonitor::new(MonitorConfig::new("c", 1.0, 0)).unwrap_err();
        assert_eq!(err, MonitorError::Window(crate::AggregatorError::ZeroCapacity));
    }

    #[test]
    fn rejects_non_finite_threshold() {
        for threshold in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = ChannelMonitor::new(MonitorConfig::new("c", threshold, 3)).unwrap_err();
            assert!(matches!(err, MonitorError::InvalidThreshold(_)));
        }
    }

    #[test]
    fn concurrent_ingest_keeps_window_in_detector_order() {
        for _ in 0..50 {
            let m = ChannelMonitor::new(MonitorConfig::new("c", 1800.0, 1000)).unwrap();

            std::thread::scope(|scope| {
                for t in 0..8u64 {
                    let m = &m;
                    scope.spawn(move || {
                        for i in 0..50u64 {
                            let value = if (t + i) % 2 == 0 { 1900.0 } else { 1700.0 };
                            m.ingest(update(value + t as f64, t * 1000 + i));
                        }
                    });
                }
            });

            let snapshot = m.snapshot();
            assert_eq!(snapshot.len(), 400);
            let last = snapshot.samples.last().unwrap().value;
            assert_eq!(Some(last), m.detector().previous());
        }
    }

    #[test]
    fn first_sample_never_fires() {
        let m = monitor();
        assert!(m.ingest(update(0.0, 1)).is_none());
        assert_eq!(m.state(), DetectorState::Below);
    }

    #[test]
    fn every_sample_reaches_the_window() {
        let m = monitor();
        m.ingest(update(1900.0, 1));
        let event = m.ingest(update(1700.0, 2));
        m.ingest(update(1650.0, 3));

        assert!(matches!(event, Some(ThresholdEvent::Crossing(_))));
        assert_eq!(m.snapshot().len(), 3);
        assert_eq!(m.statistics().min, 1650.0);
    }

    #[test]
    fn source_previous_does_not_override_baseline() {
        let m = monitor();
        m.ingest(update(1700.0, 1));

        // Source claims the prior value was above threshold, but the
        // detector's own baseline is below, so nothing fires.
        let claimed = SampleUpdate::new(
            Some(Reading::new(1900.0).unwrap()),
            Reading::new(1600.0).unwrap(),
            2,
        );
        assert!(m.ingest(claimed).is_none());
    }

    #[test]
    fn export_uses_channel_and_threshold() {
        let m = monitor();
        m.ingest(update(2500.0, 1));
        let export = m.export();
        assert_eq!(export.channel, "sensors/light");
        assert_eq!(export.threshold, 1800.0);
        assert_eq!(export.status_label, "Bright");
    }

    #[test]
    fn custom_domain_flags_out_of_range() {
        let config = MonitorConfig::new("c", 50.0, 5).domain(Domain::new(0.0, 100.0));
        let m = ChannelMonitor::new(config).unwrap();
        m.ingest(update(150.0, 1));
        assert_eq!(m.aggregator().out_of_range(), 1);
    }
}
