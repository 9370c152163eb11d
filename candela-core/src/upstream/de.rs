//! Lenient field decoders for upstream records.
//!
//! The trading API is inconsistent about timestamp and identifier encodings
//! across endpoints; these helpers accept every form observed in the wild.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

/// Parse an instant into milliseconds since the epoch.
///
/// Accepts integer milliseconds, fractional milliseconds (truncated), numeric
/// strings and RFC 3339 strings. Returns `None` for anything else.
#[must_use]
pub fn timestamp_ms(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ms) = s.parse::<i64>() {
                return Some(ms);
            }
            if let Ok(f) = s.parse::<f64>() {
                return f.is_finite().then(|| f.trunc() as i64);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis())
        }
        _ => None,
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn ts<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    timestamp_ms(&v).ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {v}")))
}

pub(crate) fn opt_ts<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(v) => timestamp_ms(&v)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {v}"))),
    }
}

pub(crate) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("unrecognized identifier: {other}"))),
    }
}

pub(crate) fn num<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    number(&v).ok_or_else(|| D::Error::custom(format!("expected a number, got {v}")))
}

pub(crate) fn opt_num<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(number))
}
