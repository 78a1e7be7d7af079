//! Lenient field parsing for stored rows
//!
//! Rows come back from the row store with loosely typed columns: numbers may
//! arrive as strings, coordinates as `""`, flags as `"true"`. Every reader in
//! the workspace goes through these helpers so that "absent" means the same
//! thing everywhere: missing, `null`, empty/blank strings and garbage all
//! parse to `None`.

use crate::geo::Coordinates;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Parse a finite number from a JSON number or numeric string.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parse an integer; fractional values are rejected.
pub fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a non-blank text value; numbers are rendered as text.
///
/// Used where a column may have been written as either a string or a
/// number (delivery codes, ids).
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a boolean flag. Absent or unrecognised values are `false`.
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Parse an RFC 3339 timestamp. Offset-less values are taken as UTC.
pub fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a coordinate pair. Both halves must parse, otherwise the pair is absent.
pub fn coordinates(latitude: Option<&Value>, longitude: Option<&Value>) -> Option<Coordinates> {
    Some(Coordinates::new(number(latitude)?, number(longitude)?))
}
