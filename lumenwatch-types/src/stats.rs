//! Window statistics and the qualitative light status derived from a value.

use crate::Sample;

/// Summary statistics over a rolling window.
///
/// `avg` is the arithmetic mean rounded to the nearest integer. For a
/// non-empty window `min <= avg <= max` holds. An empty window yields all
/// zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub current: f64,
}

impl Statistics {
    /// Compute statistics over samples in arrival order.
    ///
    /// The last sample is taken as `current`.
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut current = 0.0;

        for sample in samples {
            let v = sample.value.get();
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
            current = v;
        }

        if count == 0 {
            return Self::default();
        }

        // Rounding the mean can overshoot an extreme when all values sit
        // just beside a half; clamp to keep min <= avg <= max.
        let avg = round_half_up(sum / count as f64).clamp(min, max);

        Self {
            min,
            max,
            avg,
            current,
        }
    }
}

/// Round to the nearest integer, halves toward positive infinity.
fn round_half_up(v: f64) -> f64 {
    libm_floor(v + 0.5)
}

#[cfg(feature = "std")]
fn libm_floor(v: f64) -> f64 {
    v.floor()
}

#[cfg(not(feature = "std"))]
fn libm_floor(v: f64) -> f64 {
    let t = v as i64 as f64;
    if t > v {
        t - 1.0
    } else {
        t
    }
}

/// Qualitative light level, from fixed breakpoints on the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightStatus {
    VeryDark,
    Dark,
    Moderate,
    Bright,
    VeryBright,
}

impl LightStatus {
    /// Map a value to its status. Pure function of the value alone.
    pub fn from_value(value: f64) -> Self {
        if value < 500.0 {
            LightStatus::VeryDark
        } else if value < 1000.0 {
            LightStatus::Dark
        } else if value < 2000.0 {
            LightStatus::Moderate
        } else if value < 3000.0 {
            LightStatus::Bright
        } else {
            LightStatus::VeryBright
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            LightStatus::VeryDark => "Very Dark",
            LightStatus::Dark => "Dark",
            LightStatus::Moderate => "Moderate",
            LightStatus::Bright => "Bright",
            LightStatus::VeryBright => "Very Bright",
        }
    }

    /// Display color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            LightStatus::VeryDark => "#2C3E50",
            LightStatus::Dark => "#34495E",
            LightStatus::Moderate => "#F39C12",
            LightStatus::Bright => "#F1C40F",
            LightStatus::VeryBright => "#FFE66D",
        }
    }
}
