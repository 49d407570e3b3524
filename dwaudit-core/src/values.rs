//! Helpers for interpreting JSON cell values.
//!
//! Malformed cells never produce errors here: anything that cannot be read as
//! the requested shape yields `None` and is treated as non-matching.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::NumberFormat;

/// A parsed timestamp cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    /// Instant in UTC; naive values are interpreted as UTC
    pub instant: DateTime<Utc>,
    /// Wall-clock time as written, before any offset is applied
    pub local: NaiveDateTime,
    /// True when the source carried no time component
    pub date_only: bool,
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Extracts a finite numeric value from a JSON value.
///
/// Strings are parsed after applying the number-format hint. Non-finite
/// values such as "NaN" or "inf" are rejected so they cannot poison
/// statistics.
pub fn extract_numeric(value: &Value, format: NumberFormat) -> Option<f64> {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => format.normalize(s.trim()).parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Parses a timestamp or date string cell.
pub fn parse_timestamp(value: &Value) -> Option<ParsedTimestamp> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(ParsedTimestamp {
            instant: parsed.with_timezone(&Utc),
            local: parsed.naive_local(),
            date_only: false,
        });
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ParsedTimestamp {
                instant: naive.and_utc(),
                local: naive,
                date_only: false,
            });
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| ParsedTimestamp {
            instant: naive.and_utc(),
            local: naive,
            date_only: true,
        })
}

/// Converts a JSON value to a key used for grouping equal values.
///
/// Values keep their JSON encoding so the string `"1"` and the number `1`
/// stay distinct.
pub fn group_key(value: &Value, case_insensitive: bool) -> String {
    match value {
        Value::String(s) if case_insensitive => Value::String(s.to_lowercase()).to_string(),
        other => other.to_string(),
    }
}

/// Renders a cell for human-readable messages.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON type name of a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
