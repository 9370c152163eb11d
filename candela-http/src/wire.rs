//! Response shapes of the trading API and their conversion into core types.

use serde::Deserialize;
use serde_json::Value;

use candela_core::upstream::de::timestamp_ms;
use candela_core::{Candle, CandelaError, ChannelPoint};

/// Instants below this magnitude are read as seconds, above it as milliseconds.
const SECONDS_CUTOFF: i64 = 100_000_000_000;

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_array(value: Value, keys: &[&str]) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => keys.iter().find_map(|k| match map.remove(*k) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// Kline-style positional row: `[openTime, open, high, low, close, volume, ...]`.
fn candle_from_row(row: &[Value]) -> Option<Candle> {
    let ts = timestamp_ms(row.first()?)?;
    Some(Candle::new(
        ts,
        number(row.get(1)?)?,
        number(row.get(2)?)?,
        number(row.get(3)?)?,
        number(row.get(4)?)?,
        row.get(5).and_then(number).unwrap_or(0.0),
    ))
}

fn candle_from_object(obj: &serde_json::Map<String, Value>) -> Option<Candle> {
    let ts = ["openTime", "time", "timestamp", "t"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(timestamp_ms))?;
    let field = |names: &[&str]| names.iter().find_map(|k| obj.get(*k).and_then(number));
    Some(Candle::new(
        ts,
        field(&["open", "o"])?,
        field(&["high", "h"])?,
        field(&["low", "l"])?,
        field(&["close", "c"])?,
        field(&["volume", "v"]).unwrap_or(0.0),
    ))
}

/// Decode a candle response.
///
/// Accepts a bare array or an envelope under `data`/`candles`, with rows as
/// positional arrays or objects. Rows that cannot be read are skipped.
///
/// # Errors
/// Returns `Data` when the body holds no recognizable array.
pub fn parse_candles(body: Value) -> Result<Vec<Candle>, CandelaError> {
    let rows = first_array(body, &["data", "candles", "klines"])
        .ok_or_else(|| CandelaError::Data("candle response is not an array".into()))?;
    let candles: Vec<Candle> = rows
        .iter()
        .filter_map(|row| match row {
            Value::Array(items) => candle_from_row(items),
            Value::Object(obj) => candle_from_object(obj),
            _ => None,
        })
        .collect();
    #[cfg(feature = "tracing")]
    if candles.len() < rows.len() {
        tracing::warn!(
            skipped = rows.len() - candles.len(),
            total = rows.len(),
            "skipped unreadable candle rows"
        );
    }
    Ok(candles)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRecord {
    time: Value,
    #[serde(alias = "upper")]
    upper_band: Value,
    #[serde(alias = "lower")]
    lower_band: Value,
    #[serde(default)]
    middle: Option<Value>,
    #[serde(default)]
    oscillator: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChannelEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    history: Vec<ChannelRecord>,
    #[serde(default)]
    message: Option<String>,
}

const fn default_success() -> bool {
    true
}

/// Channel sample time in whole seconds.
fn channel_seconds(v: &Value) -> Option<i64> {
    match v {
        Value::String(s) if s.parse::<f64>().is_err() => {
            timestamp_ms(v).map(|ms| ms.div_euclid(1000))
        }
        _ => {
            let raw = timestamp_ms(v)?;
            if raw.abs() >= SECONDS_CUTOFF {
                Some(raw.div_euclid(1000))
            } else {
                Some(raw)
            }
        }
    }
}

/// Decode a channel history response `{success, history: [...]}`.
///
/// Samples with unreadable times or bands are skipped; the result is sorted
/// by time.
///
/// # Errors
/// Returns `Connector` when the upstream reports `success: false` and `Data`
/// when the body does not match the envelope.
pub fn parse_channel(body: Value, connector: &str) -> Result<Vec<ChannelPoint>, CandelaError> {
    let env: ChannelEnvelope = match body {
        Value::Array(_) => ChannelEnvelope {
            success: true,
            history: serde_json::from_value(body)
                .map_err(|e| CandelaError::Data(format!("channel history: {e}")))?,
            message: None,
        },
        other => serde_json::from_value(other)
            .map_err(|e| CandelaError::Data(format!("channel history: {e}")))?,
    };
    if !env.success {
        return Err(CandelaError::connector(
            connector,
            env.message
                .unwrap_or_else(|| "channel history request reported failure".into()),
        ));
    }
    let mut points: Vec<ChannelPoint> = env
        .history
        .iter()
        .filter_map(|r| {
            Some(ChannelPoint {
                time: channel_seconds(&r.time)?,
                upper_band: number(&r.upper_band)?,
                lower_band: number(&r.lower_band)?,
                middle: r.middle.as_ref().and_then(number),
                oscillator: r.oscillator.as_ref().and_then(number),
            })
        })
        .collect();
    points.sort_by_key(|p| p.time);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kline_rows_and_objects() {
        let rows = parse_candles(json!([
            [60_000, "1.0", "2.0", "0.5", "1.5", "10"],
            {"openTime": 120_000, "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0, "volume": 3},
            ["garbage"]
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, 60);
        assert!((rows[1].close - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn candle_envelope() {
        let rows = parse_candles(json!({"data": [[0, 1, 1, 1, 1, 1]]})).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(parse_candles(json!("nope")).is_err());
    }

    #[test]
    fn channel_times_in_seconds_millis_or_iso() {
        let pts = parse_channel(
            json!({"success": true, "history": [
                {"time": 1_700_000_060_000i64, "upperBand": 2, "lowerBand": 1},
                {"time": 1_700_000_000, "upperBand": "2.5", "lowerBand": "1.5", "middle": 2},
                {"time": "2023-11-14T22:15:20Z", "upperBand": 3, "lowerBand": 1}
            ]}),
            "test",
        )
        .unwrap();
        let times: Vec<i64> = pts.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![1_700_000_000, 1_700_000_060, 1_700_000_120]);
        assert_eq!(pts[0].middle, Some(2.0));
    }

    #[test]
    fn channel_failure_is_connector_error() {
        let err =
            parse_channel(json!({"success": false, "message": "no bot"}), "test").unwrap_err();
        assert!(matches!(err, CandelaError::Connector { ref msg, .. } if msg == "no bot"));
    }
}
