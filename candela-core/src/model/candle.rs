use serde::{Deserialize, Serialize};

use super::Timestamped;

/// One OHLCV bar.
///
/// `time` is the open time truncated to whole seconds and serves as the merge
/// and render key; `original_time` keeps the millisecond open time used for
/// alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Open time in seconds since the epoch.
    pub time: i64,
    /// Open time in milliseconds since the epoch.
    pub original_time: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

impl Candle {
    /// Build a candle from its millisecond open time.
    #[must_use]
    pub const fn new(
        open_time_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            time: open_time_ms.div_euclid(1000),
            original_time: open_time_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when every price and the volume are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Render shape consumed by the price series of the sink.
    #[must_use]
    pub const fn as_price_bar(&self) -> PriceBar {
        PriceBar {
            time: self.time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }
}

impl Timestamped for Candle {
    fn timestamp_ms(&self) -> i64 {
        self.original_time
    }
}

/// One EMA value, stamped with the coarse candle it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorPoint {
    /// Source candle time in seconds.
    pub time: i64,
    /// Source candle time in milliseconds.
    pub original_time: i64,
    /// Indicator value.
    pub value: f64,
}

impl Timestamped for IndicatorPoint {
    fn timestamp_ms(&self) -> i64 {
        self.original_time
    }
}

/// One pre-computed channel sample from the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPoint {
    /// Sample time in seconds since the epoch.
    pub time: i64,
    /// Upper band value.
    pub upper_band: f64,
    /// Lower band value.
    pub lower_band: f64,
    /// Middle line, when the upstream provides one.
    #[serde(default)]
    pub middle: Option<f64>,
    /// Oscillator reading, when the upstream provides one.
    #[serde(default)]
    pub oscillator: Option<f64>,
}

impl Timestamped for ChannelPoint {
    fn timestamp_ms(&self) -> i64 {
        self.time.saturating_mul(1000)
    }
}

/// A single-value render point for line series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    /// Time in seconds; always a reference-axis bar time.
    pub time: i64,
    /// Plotted value.
    pub value: f64,
}

/// OHLC render point for the price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Time in seconds.
    pub time: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_truncates_toward_negative_infinity() {
        let c = Candle::new(1_700_000_000_999, 1.0, 1.0, 1.0, 1.0, 0.0);
        assert_eq!(c.time, 1_700_000_000);
        let c = Candle::new(-1, 1.0, 1.0, 1.0, 1.0, 0.0);
        assert_eq!(c.time, -1);
    }

    #[test]
    fn non_finite_detected() {
        let mut c = Candle::new(0, 1.0, 2.0, 0.5, 1.5, 10.0);
        assert!(c.is_finite());
        c.volume = f64::NAN;
        assert!(!c.is_finite());
        c.volume = 1.0;
        c.high = f64::INFINITY;
        assert!(!c.is_finite());
    }

    #[test]
    fn channel_point_reads_optional_fields() {
        let p: ChannelPoint =
            serde_json::from_str(r#"{"time":60,"upperBand":2.0,"lowerBand":1.0}"#).unwrap();
        assert_eq!(p.middle, None);
        assert_eq!(p.timestamp_ms(), 60_000);
    }
}
