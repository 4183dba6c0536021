//! The window export handed to presentation consumers.

use alloc::vec::Vec;

use crate::{LightStatus, Sample, Statistics, EXPORT_VERSION};

/// Expected value range of the sensing hardware.
///
/// Used to scale gauges and to flag out-of-range samples. Readings outside
/// the domain are still accepted everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    /// 12-bit ADC range of the light sensor.
    pub const ADC_12_BIT: Domain = Domain {
        min: 0.0,
        max: 4095.0,
    };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Position of `value` in the domain as a percentage, clamped to `[0, 100]`.
    ///
    /// A degenerate domain (`max <= min`) yields 0.
    pub fn gauge_percent(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::ADC_12_BIT
    }
}

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportPoint {
    /// Unix timestamp in milliseconds.
    pub time_ms: u64,
    pub value: f64,
    /// Whether the point sits below the alert threshold (drawn in the alert color).
    pub below_threshold: bool,
}

/// Everything a dashboard needs to draw the channel: ordered history,
/// statistics, and the status derived from the current value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowExport {
    /// [`EXPORT_VERSION`] of the writer.
    pub version: u32,
    /// Channel path the samples came from.
    pub channel: alloc::string::String,
    pub threshold: f64,
    /// Oldest first.
    pub points: Vec<ExportPoint>,
    pub statistics: Statistics,
    pub status: LightStatus,
    pub status_label: alloc::string::String,
    pub status_color: alloc::string::String,
    pub gauge_percent: f64,
    /// Samples seen outside the domain since the aggregator was created.
    pub out_of_range: u64,
}

impl WindowExport {
    /// Build an export from window contents in arrival order.
    pub fn build(
        channel: &str,
        samples: &[Sample],
        statistics: Statistics,
        threshold: f64,
        domain: Domain,
        out_of_range: u64,
    ) -> Self {
        let points = samples
            .iter()
            .map(|s| ExportPoint {
                time_ms: s.timestamp_ms,
                value: s.value.get(),
                below_threshold: s.value.get() < threshold,
            })
            .collect();

        let status = LightStatus::from_value(statistics.current);

        Self {
            version: EXPORT_VERSION,
            channel: channel.into(),
            threshold,
            points,
            statistics,
            status,
            status_label: status.label().into(),
            status_color: status.color().into(),
            gauge_percent: domain.gauge_percent(statistics.current),
            out_of_range,
        }
    }

    /// The most recent `n` points, oldest first.
    pub fn recent(&self, n: usize) -> &[ExportPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether this export was written in the format this crate reads.
    ///
    /// Exports from older or newer writers may still deserialize while
    /// carrying fields with different meaning; consumers should check this
    /// before drawing anything.
    pub fn is_supported(&self) -> bool {
        self.version == EXPORT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reading;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(1000 + i as u64, Reading::new(*v).unwrap()))
            .collect()
    }

    #[test]
    fn gauge_percent_clamps() {
        let d = Domain::ADC_12_BIT;
        assert_eq!(d.gauge_percent(0.0), 0.0);
        assert_eq!(d.gauge_percent(4095.0), 100.0);
        assert_eq!(d.gauge_percent(-100.0), 0.0);
        assert_eq!(d.gauge_percent(9000.0), 100.0);
        assert!((d.gauge_percent(2047.5) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_domain_gauge_is_zero() {
        assert_eq!(Domain::new(5.0, 5.0).gauge_percent(5.0), 0.0);
    }

    #[test]
    fn domain_contains_is_inclusive() {
        let d = Domain::ADC_12_BIT;
        assert!(d.contains(0.0));
        assert!(d.contains(4095.0));
        assert!(!d.contains(4095.5));
        assert!(!d.contains(-1.0));
    }

    #[test]
    fn build_marks_points_below_threshold() {
        let s = samples(&[1900.0, 1800.0, 1700.0]);
        let stats = Statistics::from_samples(&s);
        let export = WindowExport::build("sensors/light", &s, stats, 1800.0, Domain::default(), 0);

        let flags: Vec<bool> = export.points.iter().map(|p| p.below_threshold).collect();
        assert_eq!(flags, alloc::vec![false, false, true]);
        assert_eq!(export.points[0].time_ms, 1000);
        assert_eq!(export.status, LightStatus::Moderate);
        assert_eq!(export.status_label, "Moderate");
        assert_eq!(export.channel, "sensors/light");
    }

    #[test]
    fn recent_returns_tail() {
        let s = samples(&[1.0, 2.0, 3.0, 4.0]);
        let stats = Statistics::from_samples(&s);
        let export = WindowExport::build("c", &s, stats, 0.0, Domain::default(), 0);

        let tail: Vec<f64> = export.recent(2).iter().map(|p| p.value).collect();
        assert_eq!(tail, alloc::vec![3.0, 4.0]);
        assert_eq!(export.recent(10).len(), 4);
    }

    #[test]
    fn empty_export() {
        let export = WindowExport::build("c", &[], Statistics::default(), 1800.0, Domain::default(), 0);
        assert!(export.is_empty());
        assert_eq!(export.status, LightStatus::VeryDark);
        assert_eq!(export.gauge_percent, 0.0);
    }

    #[test]
    fn export_carries_current_version() {
        let mut export =
            WindowExport::build("c", &[], Statistics::default(), 1800.0, Domain::default(), 0);
        assert_eq!(export.version, EXPORT_VERSION);
        assert!(export.is_supported());

        export.version = EXPORT_VERSION + 1;
        assert!(!export.is_supported());
    }
}
