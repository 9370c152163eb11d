use candela_core::timeseries::resample::bucket_start_ms;
use candela_core::{Candle, Resolution};

use super::HOUR_MS;

/// Reference price level of a symbol.
#[must_use]
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "BTCUSDT" => 42_000.0,
        "ETHUSDT" => 2_300.0,
        "SOLUSDT" => 95.0,
        other => {
            let h = other
                .bytes()
                .fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
            100.0 + f64::from(h % 900)
        }
    }
}

/// Mid price of `symbol` at `ms`.
#[must_use]
pub fn mid_price(symbol: &str, ms: i64) -> f64 {
    let hours = ms as f64 / HOUR_MS as f64;
    base_price(symbol) * (1.0 + 0.02 * (hours / 7.0).sin() + 0.005 * (hours * 1.3).cos())
}

/// The bar of `symbol` opening at `open_ms`.
#[must_use]
pub fn candle_at(symbol: &str, open_ms: i64, resolution: Resolution) -> Candle {
    let open = mid_price(symbol, open_ms);
    let close = mid_price(symbol, open_ms + resolution.as_millis());
    let hours = open_ms as f64 / HOUR_MS as f64;
    Candle::new(
        open_ms,
        open,
        open.max(close) * 1.001,
        open.min(close) * 0.999,
        close,
        10.0 + 5.0 * hours.sin().abs(),
    )
}

/// True for bars the `GAPPY` symbol never reports.
#[must_use]
pub fn is_missing(symbol: &str, open_ms: i64, resolution: Resolution) -> bool {
    symbol == "GAPPY" && (open_ms / resolution.as_millis()).rem_euclid(97) == 13
}

/// Bars opening in `[start_ms, end_ms)`, at most `limit` of them.
#[must_use]
pub fn candles(
    symbol: &str,
    resolution: Resolution,
    start_ms: i64,
    end_ms: i64,
    limit: u32,
) -> Vec<Candle> {
    let step = resolution.as_millis();
    let mut t = bucket_start_ms(start_ms, resolution);
    if t < start_ms {
        t += step;
    }
    let mut out = Vec::new();
    while t < end_ms && out.len() < limit as usize {
        if !is_missing(symbol, t, resolution) {
            out.push(candle_at(symbol, t, resolution));
        }
        t += step;
    }
    out
}
