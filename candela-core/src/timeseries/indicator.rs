use crate::model::{Candle, IndicatorPoint};

/// Exponential moving average of the closes.
///
/// The first value sits on candle `periods - 1` and equals the simple mean of
/// the first `periods` closes. Each later value is
/// `close * k + previous * (1 - k)` with `k = 2 / (periods + 1)`.
///
/// Returns an empty sequence when `periods` is zero or longer than the input.
/// Each point carries the time of the candle it was computed on, so the
/// output has exactly `len - periods + 1` points.
///
/// ```
/// use candela_core::{Candle, compute_ema};
///
/// let closes = [1.0, 2.0, 3.0, 4.0];
/// let candles: Vec<Candle> = closes
///     .iter()
///     .enumerate()
///     .map(|(i, &c)| Candle::new(i as i64 * 60_000, c, c, c, c, 0.0))
///     .collect();
/// let ema = compute_ema(&candles, 3);
/// assert_eq!(ema.len(), 2);
/// assert_eq!(ema[0].value, 2.0);
/// assert_eq!(ema[1].value, 3.0);
/// ```
#[must_use]
pub fn compute_ema(series: &[Candle], periods: usize) -> Vec<IndicatorPoint> {
    if periods == 0 || series.len() < periods {
        return Vec::new();
    }
    let n = periods as f64;
    let k = 2.0 / (n + 1.0);
    let seed = series[..periods].iter().map(|c| c.close).sum::<f64>() / n;

    let mut out = Vec::with_capacity(series.len() - periods + 1);
    let anchor = &series[periods - 1];
    out.push(IndicatorPoint {
        time: anchor.time,
        original_time: anchor.original_time,
        value: seed,
    });
    let mut prev = seed;
    for c in &series[periods..] {
        prev = c.close * k + prev * (1.0 - k);
        out.push(IndicatorPoint {
            time: c.time,
            original_time: c.original_time,
            value: prev,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64 * 3_600_000, c, c, c, c, 0.0))
            .collect()
    }

    #[test]
    fn shorter_than_periods_is_empty() {
        assert!(compute_ema(&series(&[1.0, 2.0]), 3).is_empty());
        assert!(compute_ema(&series(&[1.0, 2.0]), 0).is_empty());
        assert!(compute_ema(&[], 1).is_empty());
    }

    #[test]
    fn exact_length_yields_seed_only() {
        let out = compute_ema(&series(&[2.0, 4.0, 6.0]), 3);
        assert_eq!(out.len(), 1);
        assert!((out[0].value - 4.0).abs() < 1e-12);
        assert_eq!(out[0].original_time, 2 * 3_600_000);
    }

    #[test]
    fn constant_series_is_fixed_point() {
        let out = compute_ema(&series(&[5.0; 40]), 20);
        assert_eq!(out.len(), 21);
        assert!(out.iter().all(|p| (p.value - 5.0).abs() < 1e-12));
    }

    #[test]
    fn period_one_tracks_closes() {
        let closes = [3.0, 1.0, 4.0, 1.0, 5.0];
        let out = compute_ema(&series(&closes), 1);
        let values: Vec<f64> = out.iter().map(|p| p.value).collect();
        assert_eq!(values, closes.to_vec());
    }
}
