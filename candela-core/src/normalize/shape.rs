use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::upstream::{AggregatedPosition, SignalRecord};
use candela_types::CandelaError;

/// Envelope keys under which the upstream nests its record arrays.
const ENVELOPE_KEYS: [&str; 5] = ["positions", "history", "signals", "data", "items"];

/// Position records in whichever shape the upstream produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionPayload {
    /// Pre-aggregated positions, one record per position.
    Aggregated(Vec<AggregatedPosition>),
    /// Raw entry/exit signals, several records per position.
    Signals(Vec<SignalRecord>),
}

impl Default for PositionPayload {
    fn default() -> Self {
        Self::Aggregated(Vec::new())
    }
}

impl PositionPayload {
    /// Resolve the shape of a raw JSON payload.
    ///
    /// Accepts a bare array or an object wrapping one under a known envelope
    /// key. A record carrying `type` and `positionId` but no `entries` marks
    /// the payload as signals; anything else is read as aggregated positions.
    /// Records that fail to decode are skipped.
    ///
    /// # Errors
    /// Returns `Data` when the payload is neither an array nor an envelope
    /// around one.
    pub fn detect(value: Value) -> Result<Self, CandelaError> {
        let records = match unwrap_envelope(value, 2) {
            Value::Array(records) => records,
            Value::Null => Vec::new(),
            other => {
                return Err(CandelaError::Data(format!(
                    "unrecognized position payload: expected an array, got {}",
                    kind_of(&other)
                )));
            }
        };
        let is_signals = records.iter().find_map(Value::as_object).is_some_and(|o| {
            o.contains_key("type") && o.contains_key("positionId") && !o.contains_key("entries")
        });
        if is_signals {
            Ok(Self::Signals(decode_each(records)))
        } else {
            Ok(Self::Aggregated(decode_each(records)))
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Aggregated(v) => v.len(),
            Self::Signals(v) => v.len(),
        }
    }

    /// True when the payload holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<AggregatedPosition>> for PositionPayload {
    fn from(v: Vec<AggregatedPosition>) -> Self {
        Self::Aggregated(v)
    }
}

impl From<Vec<SignalRecord>> for PositionPayload {
    fn from(v: Vec<SignalRecord>) -> Self {
        Self::Signals(v)
    }
}

fn unwrap_envelope(value: Value, depth: u8) -> Value {
    match value {
        Value::Object(mut map) if depth > 0 => {
            let key = ENVELOPE_KEYS
                .iter()
                .find(|k| matches!(map.get(**k), Some(Value::Array(_) | Value::Object(_))));
            match key.and_then(|k| map.remove(*k)) {
                Some(inner) => unwrap_envelope(inner, depth - 1),
                None => Value::Object(map),
            }
        }
        other => other,
    }
}

fn decode_each<T: DeserializeOwned>(records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|r| match serde_json::from_value::<T>(r) {
            Ok(v) => Some(v),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "skipping malformed position record");
                None
            }
        })
        .collect()
}

const fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
