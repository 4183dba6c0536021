//! Decoding sample-source payloads at the ingestion boundary.
//!
//! The source delivers untyped JSON. Everything that is not a finite number
//! is rejected here as [`MalformedSample`] so it never reaches the detector.

use serde_json::Value;

use lumenwatch_types::{MalformedSample, Reading, SampleUpdate};

/// Turns raw JSON payloads into [`SampleUpdate`]s.
///
/// Accepted shapes:
///
/// - a bare number: `1750`
/// - an object holding the configured field: `{"light": 1750}`, optionally
///   with `"previous"` and `"timestamp_ms"`
/// - a change record: `{"before": 1850, "after": 1750}`
#[derive(Debug, Clone)]
pub struct SampleDecoder {
    field: String,
}

impl Default for SampleDecoder {
    fn default() -> Self {
        Self::new("light")
    }
}

impl SampleDecoder {
    /// Create a decoder that reads the value from `field` in object payloads.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Decode one payload. `now_ms` stamps payloads that carry no timestamp.
    pub fn decode(&self, payload: &str, now_ms: u64) -> Result<SampleUpdate, MalformedSample> {
        let value: Value = serde_json::from_str(payload.trim())
            .map_err(|e| MalformedSample::Syntax(e.to_string()))?;
        self.decode_value(&value, now_ms)
    }

    /// Decode an already-parsed JSON value.
    pub fn decode_value(&self, value: &Value, now_ms: u64) -> Result<SampleUpdate, MalformedSample> {
        match value {
            Value::Object(map) => {
                let timestamp_ms = match map.get("timestamp_ms") {
                    None | Some(Value::Null) => now_ms,
                    Some(v) => v.as_u64().ok_or_else(|| MalformedSample::NotNumeric {
                        found: kind(v).to_string(),
                    })?,
                };

                if let Some(after) = map.get("after") {
                    let previous = optional_reading(map.get("before"))?;
                    return Ok(SampleUpdate::new(previous, reading(after)?, timestamp_ms));
                }

                let current = map.get(&self.field).ok_or(MalformedSample::Missing)?;
                let previous = optional_reading(map.get("previous"))?;
                Ok(SampleUpdate::new(previous, reading(current)?, timestamp_ms))
            }
            other => Ok(SampleUpdate::new(None, reading(other)?, now_ms)),
        }
    }
}

fn reading(value: &Value) -> Result<Reading, MalformedSample> {
    match value {
        Value::Number(n) => Reading::new(n.as_f64().ok_or(MalformedSample::NotFinite)?),
        Value::Null => Err(MalformedSample::Missing),
        other => Err(MalformedSample::NotNumeric {
            found: kind(other).to_string(),
        }),
    }
}

fn optional_reading(value: Option<&Value>) -> Result<Option<Reading>, MalformedSample> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => reading(v).map(Some),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_number() {
        let update = SampleDecoder::default().decode("1750", 9).unwrap();
        assert_eq!(update.value.get(), 1750.0);
        assert_eq!(update.previous, None);
        assert_eq!(update.timestamp_ms, 9);
    }

    #[test]
    fn decodes_configured_field() {
        let decoder = SampleDecoder::new("lux");
        let update = decoder
            .decode(r#"{"lux": 12.5, "previous": 20, "timestamp_ms": 100}"#, 0)
            .unwrap();
        assert_eq!(update.value.get(), 12.5);
        assert_eq!(update.previous.map(|r| r.get()), Some(20.0));
        assert_eq!(update.timestamp_ms, 100);
    }

    #[test]
    fn decodes_change_record() {
        let update = SampleDecoder::default()
            .decode(r#"{"before": 1850, "after": 1750}"#, 5)
            .unwrap();
        assert_eq!(update.previous.map(|r| r.get()), Some(1850.0));
        assert_eq!(update.value.get(), 1750.0);
        assert_eq!(update.timestamp_ms, 5);
    }

    #[test]
    fn null_previous_is_absent() {
        let update = SampleDecoder::default()
            .decode(r#"{"light": 1, "previous": null}"#, 0)
            .unwrap();
        assert!(update.previous.is_none());
    }

    #[test]
    fn rejects_non_numeric_value() {
        let err = SampleDecoder::default().decode(r#""bright""#, 0).unwrap_err();
        assert_eq!(
            err,
            MalformedSample::NotNumeric {
                found: "string".into()
            }
        );

        let err = SampleDecoder::default()
            .decode(r#"{"light": true}"#, 0)
            .unwrap_err();
        assert_eq!(err, MalformedSample::NotNumeric { found: "bool".into() });
    }

    #[test]
    fn rejects_missing_field() {
        let err = SampleDecoder::default()
            .decode(r#"{"temperature": 21}"#, 0)
            .unwrap_err();
        assert_eq!(err, MalformedSample::Missing);

        let err = SampleDecoder::default().decode("null", 0).unwrap_err();
        assert_eq!(err, MalformedSample::Missing);
    }

    #[test]
    fn rejects_garbage() {
        let err = SampleDecoder::default().decode("not json", 0).unwrap_err();
        assert!(matches!(err, MalformedSample::Syntax(_)));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let err = SampleDecoder::default()
            .decode(r#"{"light": 1, "timestamp_ms": "soon"}"#, 0)
            .unwrap_err();
        assert!(matches!(err, MalformedSample::NotNumeric { .. }));
    }
}
