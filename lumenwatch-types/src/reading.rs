//! Validated readings and the samples built from them.

use alloc::string::String;
use core::fmt;

/// A single numeric reading from the light sensor channel.
///
/// Any finite value is accepted; the detector does not assume the
/// hardware's 0-4095 range. NaN and infinities are rejected at construction
/// so they can never reach threshold evaluation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct Reading(f64);

impl Reading {
    /// Create a reading, rejecting non-finite values.
    pub fn new(value: f64) -> Result<Self, MalformedSample> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(MalformedSample::NotFinite)
        }
    }

    /// The raw value.
    pub const fn get(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Reading {
    type Error = MalformedSample;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Reading> for f64 {
    fn from(r: Reading) -> Self {
        r.0
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an incoming notification could not be turned into a reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedSample {
    /// The value was NaN or infinite.
    NotFinite,
    /// The notification carried no value.
    Missing,
    /// The value had a non-numeric type (e.g. "string", "bool", "null").
    NotNumeric { found: String },
    /// The payload could not be parsed at all.
    Syntax(String),
}

impl fmt::Display for MalformedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedSample::NotFinite => write!(f, "value is not a finite number"),
            MalformedSample::Missing => write!(f, "value is missing"),
            MalformedSample::NotNumeric { found } => {
                write!(f, "expected a number, found {}", found)
            }
            MalformedSample::Syntax(msg) => write!(f, "unparseable payload: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MalformedSample {}

/// A timestamped reading. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// The reading.
    pub value: Reading,
}

impl Sample {
    pub const fn new(timestamp_ms: u64, value: Reading) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// One change notification from the sample source.
///
/// `previous` is what the source believes the prior value was; it is
/// absent for the first notification on a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleUpdate {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub previous: Option<Reading>,
    pub value: Reading,
    pub timestamp_ms: u64,
}

impl SampleUpdate {
    pub const fn new(previous: Option<Reading>, value: Reading, timestamp_ms: u64) -> Self {
        Self {
            previous,
            value,
            timestamp_ms,
        }
    }

    /// The sample carried by this update.
    pub const fn sample(&self) -> Sample {
        Sample::new(self.timestamp_ms, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite() {
        assert_eq!(Reading::new(f64::NAN), Err(MalformedSample::NotFinite));
        assert_eq!(Reading::new(f64::INFINITY), Err(MalformedSample::NotFinite));
        assert_eq!(
            Reading::new(f64::NEG_INFINITY),
            Err(MalformedSample::NotFinite)
        );
    }

    #[test]
    fn accepts_values_outside_hardware_range() {
        assert_eq!(Reading::new(-12.5).unwrap().get(), -12.5);
        assert_eq!(Reading::new(10_000.0).unwrap().get(), 10_000.0);
    }

    #[test]
    fn display_drops_trailing_zero() {
        let r = Reading::new(1750.0).unwrap();
        assert_eq!(r.to_string(), "1750");
    }

    #[test]
    fn update_exposes_sample() {
        let update = SampleUpdate::new(
            Some(Reading::new(1850.0).unwrap()),
            Reading::new(1750.0).unwrap(),
            42,
        );
        let sample = update.sample();
        assert_eq!(sample.timestamp_ms, 42);
        assert_eq!(sample.value.get(), 1750.0);
    }

    #[test]
    fn malformed_messages() {
        let err = MalformedSample::NotNumeric {
            found: "string".into(),
        };
        assert_eq!(err.to_string(), "expected a number, found string");
        assert_eq!(MalformedSample::Missing.to_string(), "value is missing");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_nan_via_try_from() {
        let ok: Reading = serde_json::from_str("1800").unwrap();
        assert_eq!(ok.get(), 1800.0);

        let sample: Sample = serde_json::from_str(r#"{"timestamp_ms":5,"value":12.5}"#).unwrap();
        assert_eq!(sample.value.get(), 12.5);

        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"timestamp_ms":5,"value":12.5}"#);
    }
}
