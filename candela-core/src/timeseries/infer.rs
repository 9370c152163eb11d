use crate::model::Candle;
use candela_types::{Gap, Resolution};

/// Estimate a representative step (in milliseconds) from positive adjacent
/// open-time deltas in the input series.
///
/// Prefer the mode (most frequent positive delta); if there is no unique mode,
/// return the lower median.
///
/// Examples
///
/// Unique mode (60s):
///
/// ```
/// use candela_core::{Candle, estimate_step_ms};
///
/// let mk = |s: i64| Candle::new(s * 1000, 1.0, 1.0, 1.0, 1.0, 0.0);
/// // Adjacent deltas: 60,60,60,120,180  => unique mode is 60
/// let candles = vec![mk(0), mk(60), mk(120), mk(180), mk(300), mk(480)];
/// assert_eq!(estimate_step_ms(&candles), Some(60_000));
/// ```
///
/// No unique mode: fall back to lower median (60s):
///
/// ```
/// use candela_core::{Candle, estimate_step_ms};
///
/// let mk = |s: i64| Candle::new(s * 1000, 1.0, 1.0, 1.0, 1.0, 0.0);
/// // Adjacent deltas: 60,60,120,120  => lower median is 60
/// let candles = vec![mk(0), mk(60), mk(120), mk(240), mk(360)];
/// assert_eq!(estimate_step_ms(&candles), Some(60_000));
/// ```
///
/// The input order does not matter; duplicates are ignored. Returns `None` if
/// fewer than two distinct timestamps are present.
#[must_use]
pub fn estimate_step_ms(candles: &[Candle]) -> Option<i64> {
    if candles.len() < 2 {
        return None;
    }
    let mut ts: Vec<i64> = candles.iter().map(|c| c.original_time).collect();
    ts.sort_unstable();

    let mut deltas: Vec<i64> = Vec::with_capacity(ts.len().saturating_sub(1));
    let mut last = ts[0];
    for &cur in ts.iter().skip(1) {
        if cur > last {
            deltas.push(cur - last);
            last = cur;
        }
    }
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();

    let mut best_delta: i64 = deltas[0];
    let mut best_count: usize = 0;
    let mut num_best_candidates: usize = 0;

    let mut cur_delta: i64 = deltas[0];
    let mut cur_count: usize = 1;
    for &d in deltas.iter().skip(1) {
        if d == cur_delta {
            cur_count += 1;
            continue;
        }
        if cur_count > best_count {
            best_count = cur_count;
            best_delta = cur_delta;
            num_best_candidates = 1;
        } else if cur_count == best_count {
            num_best_candidates = num_best_candidates.saturating_add(1);
        }
        cur_delta = d;
        cur_count = 1;
    }
    if cur_count > best_count {
        best_delta = cur_delta;
        num_best_candidates = 1;
    } else if cur_count == best_count {
        num_best_candidates = num_best_candidates.saturating_add(1);
    }

    if num_best_candidates == 1 {
        return Some(best_delta);
    }

    // Lower median
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 1 {
        Some(deltas[mid])
    } else {
        Some(deltas[mid - 1])
    }
}

/// Report holes in a sorted series.
///
/// A gap is recorded between two consecutive candles whose open times differ
/// by at least twice the nominal bar duration of `resolution`, i.e. at least
/// one whole bar is missing. Gaps are informational; nothing is interpolated.
#[must_use]
pub fn detect_gaps(candles: &[Candle], resolution: Resolution) -> Vec<Gap> {
    let bar = resolution.as_millis();
    candles
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (pair[0].original_time, pair[1].original_time);
            let delta = b - a;
            (delta >= 2 * bar).then(|| Gap {
                after_ms: a,
                before_ms: b,
                missing_bars: delta / bar - 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(min: i64) -> Candle {
        Candle::new(min * 60_000, 1.0, 1.0, 1.0, 1.0, 0.0)
    }

    #[test]
    fn contiguous_series_has_no_gaps() {
        let candles: Vec<Candle> = (0..10).map(mk).collect();
        assert!(detect_gaps(&candles, Resolution::M1).is_empty());
    }

    #[test]
    fn single_missing_bar_is_a_gap() {
        let candles = vec![mk(0), mk(1), mk(3)];
        let gaps = detect_gaps(&candles, Resolution::M1);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].missing_bars, 1);
    }

    #[test]
    fn wide_hole_is_reported() {
        let candles = vec![mk(0), mk(1), mk(10), mk(11)];
        let gaps = detect_gaps(&candles, Resolution::M1);
        assert_eq!(
            gaps,
            vec![Gap {
                after_ms: 60_000,
                before_ms: 600_000,
                missing_bars: 8
            }]
        );
    }

    #[test]
    fn step_needs_two_distinct_times() {
        assert_eq!(estimate_step_ms(&[mk(0)]), None);
        assert_eq!(estimate_step_ms(&[mk(0), mk(0)]), None);
        assert_eq!(estimate_step_ms(&[mk(5), mk(0)]), Some(300_000));
    }
}
