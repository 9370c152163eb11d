use std::collections::BTreeMap;

use crate::model::{
    Candle, LinePoint, Marker, MarkerPosition, MarkerShape, Position, Timestamped,
};
use candela_types::AlignmentStats;

const ENTRY_COLOR: &str = "#2962FF";
const PROFIT_COLOR: &str = "#26A69A";
const LOSS_COLOR: &str = "#EF5350";
const NEUTRAL_COLOR: &str = "#FF9800";

/// Index of the axis value nearest to `target`, if within `tolerance`.
///
/// `axis` must be sorted ascending. Ties between two equally distant
/// neighbours resolve to the earlier one.
///
/// ```
/// use candela_core::nearest_index;
///
/// assert_eq!(nearest_index(&[0, 60, 120], 125, 5), Some(2));
/// assert_eq!(nearest_index(&[0, 60, 120], 125, 2), None);
/// ```
#[must_use]
pub fn nearest_index(axis: &[i64], target: i64, tolerance: i64) -> Option<usize> {
    let right = axis.partition_point(|&t| t < target);
    let dist = |i: usize| axis[i].abs_diff(target);
    let best = match (right.checked_sub(1), (right < axis.len()).then_some(right)) {
        (Some(l), Some(r)) => {
            if dist(r) < dist(l) {
                r
            } else {
                l
            }
        }
        (Some(l), None) => l,
        (None, Some(r)) => r,
        (None, None) => return None,
    };
    (dist(best) <= tolerance.unsigned_abs()).then_some(best)
}

/// The bar times of the fine series, against which every other series is
/// snapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceAxis {
    keys_ms: Vec<i64>,
    times: Vec<i64>,
}

impl ReferenceAxis {
    /// Axis over a merged candle series (sorted, unique `time`).
    #[must_use]
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            keys_ms: candles.iter().map(|c| c.original_time).collect(),
            times: candles.iter().map(|c| c.time).collect(),
        }
    }

    /// Axis over whole-second bar times in any order.
    #[must_use]
    pub fn from_times(times: impl IntoIterator<Item = i64>) -> Self {
        let mut times: Vec<i64> = times.into_iter().collect();
        times.sort_unstable();
        times.dedup();
        Self {
            keys_ms: times.iter().map(|t| t.saturating_mul(1000)).collect(),
            times,
        }
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when the axis has no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Bar times in seconds.
    #[must_use]
    pub fn times(&self) -> &[i64] {
        &self.times
    }

    /// Nearest bar to `ts_ms` within `tolerance_ms`: its index and distance.
    #[must_use]
    pub fn snap(&self, ts_ms: i64, tolerance_ms: i64) -> Option<(usize, u64)> {
        nearest_index(&self.keys_ms, ts_ms, tolerance_ms)
            .map(|i| (i, self.keys_ms[i].abs_diff(ts_ms)))
    }

    /// Bar time (seconds) at `index`.
    #[must_use]
    pub fn time_at(&self, index: usize) -> Option<i64> {
        self.times.get(index).copied()
    }
}

/// Source points snapped onto a reference axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned<T> {
    /// `(axis time in seconds, source point)` in strictly increasing time.
    pub points: Vec<(i64, T)>,
    /// Match/miss/collision counts.
    pub stats: AlignmentStats,
}

impl<T> Aligned<T> {
    /// Project the aligned points into a line series, skipping non-finite values.
    pub fn line(&self, value: impl Fn(&T) -> f64) -> Vec<LinePoint> {
        self.points
            .iter()
            .filter_map(|(time, p)| {
                let v = value(p);
                v.is_finite().then_some(LinePoint {
                    time: *time,
                    value: v,
                })
            })
            .collect()
    }
}

/// Snap every point onto its nearest reference bar within `tolerance_ms`.
///
/// Points with no bar in tolerance are dropped. When several points land on
/// the same bar the closest one wins (the earliest in input order on ties),
/// so output times stay unique.
pub fn align_points<T: Timestamped + Clone>(
    axis: &ReferenceAxis,
    points: &[T],
    tolerance_ms: i64,
) -> Aligned<T> {
    let mut slots: BTreeMap<usize, (u64, T)> = BTreeMap::new();
    let mut stats = AlignmentStats::default();
    for p in points {
        let Some((idx, distance)) = axis.snap(p.timestamp_ms(), tolerance_ms) else {
            stats.missed += 1;
            continue;
        };
        match slots.get_mut(&idx) {
            Some(slot) => {
                stats.collisions += 1;
                if distance < slot.0 {
                    *slot = (distance, p.clone());
                }
            }
            None => {
                slots.insert(idx, (distance, p.clone()));
            }
        }
    }
    stats.matched = slots.len();
    let points = slots
        .into_iter()
        .filter_map(|(idx, (_, p))| axis.time_at(idx).map(|t| (t, p)))
        .collect();
    Aligned { points, stats }
}

fn ordinal(n: usize) -> String {
    match n {
        0 => "FIRST".to_string(),
        1 => "SECOND".to_string(),
        2 => "THIRD".to_string(),
        _ => format!("ENTRY {}", n + 1),
    }
}

fn format_price(price: f64) -> String {
    if price.abs() >= 1.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.6}")
    }
}

/// Build entry and exit markers for normalized positions.
///
/// Every entry and the exit are snapped independently; unmatched fills are
/// omitted and only counted. Entries sit below the bar labeled by ordinal,
/// exits above it colored by profit sign. Output is sorted by time; several
/// markers may share a bar.
pub fn build_markers(
    axis: &ReferenceAxis,
    positions: &[Position],
    tolerance_ms: i64,
) -> (Vec<Marker>, AlignmentStats) {
    let mut markers = Vec::new();
    let mut stats = AlignmentStats::default();
    let place = |ts_ms: i64, stats: &mut AlignmentStats| {
        let snapped = axis
            .snap(ts_ms, tolerance_ms)
            .and_then(|(idx, _)| axis.time_at(idx));
        if snapped.is_some() {
            stats.matched += 1;
        } else {
            stats.missed += 1;
        }
        snapped
    };

    for pos in positions {
        for (n, entry) in pos.entries.iter().enumerate() {
            if let Some(time) = place(entry.timestamp, &mut stats) {
                markers.push(Marker {
                    time,
                    position: MarkerPosition::BelowBar,
                    shape: MarkerShape::ArrowUp,
                    color: ENTRY_COLOR.to_string(),
                    text: format!("{} {}", ordinal(n), format_price(entry.price)),
                    id: format!("{}-entry-{n}", pos.id),
                });
            }
        }
        if let Some(exit) = &pos.exit
            && let Some(time) = place(exit.timestamp, &mut stats)
        {
            let color = match exit.is_profitable() {
                Some(true) => PROFIT_COLOR,
                Some(false) => LOSS_COLOR,
                None => NEUTRAL_COLOR,
            };
            markers.push(Marker {
                time,
                position: MarkerPosition::AboveBar,
                shape: MarkerShape::ArrowDown,
                color: color.to_string(),
                text: format!("EXIT {}", format_price(exit.price)),
                id: format!("{}-exit", pos.id),
            });
        }
    }
    markers.sort_by_key(|m| m.time);
    (markers, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Exit, IndicatorPoint};

    fn point(ms: i64, value: f64) -> IndicatorPoint {
        IndicatorPoint {
            time: ms.div_euclid(1000),
            original_time: ms,
            value,
        }
    }

    #[test]
    fn nearest_prefers_earlier_on_ties() {
        assert_eq!(nearest_index(&[0, 10], 5, 5), Some(0));
        assert_eq!(nearest_index(&[0, 10], 6, 5), Some(1));
        assert_eq!(nearest_index(&[], 6, 5), None);
        assert_eq!(nearest_index(&[100], 0, 99), None);
        assert_eq!(nearest_index(&[100], 0, 100), Some(0));
    }

    #[test]
    fn collisions_keep_closest() {
        let axis = ReferenceAxis::from_times([0, 60, 120]);
        let pts = vec![point(50_000, 1.0), point(61_000, 2.0), point(65_000, 3.0)];
        let aligned = align_points(&axis, &pts, 20_000);
        assert_eq!(aligned.points.len(), 1);
        assert_eq!(aligned.points[0].0, 60);
        assert!((aligned.points[0].1.value - 2.0).abs() < f64::EPSILON);
        assert_eq!(aligned.stats.matched, 1);
        assert_eq!(aligned.stats.collisions, 2);
        assert_eq!(aligned.stats.total(), 3);
    }

    #[test]
    fn misses_are_counted_not_returned() {
        let axis = ReferenceAxis::from_times([0, 60]);
        let aligned = align_points(&axis, &[point(500_000, 1.0)], 120_000);
        assert!(aligned.points.is_empty());
        assert_eq!(aligned.stats.missed, 1);
    }

    #[test]
    fn two_entries_and_exit_make_three_markers() {
        let axis = ReferenceAxis::from_times((0..10).map(|m| m * 60));
        let entry = |ts: i64, price: f64| Entry {
            timestamp: ts,
            price,
            allocation: 1.0,
            amount: None,
            sub_type: None,
        };
        let pos = Position::new(
            "42",
            vec![entry(60_000, 10.0), entry(125_000, 9.0)],
            Some(Exit {
                timestamp: 300_000,
                price: 11.0,
                profit: Some(1.0),
                profit_percent: None,
            }),
            None,
        )
        .unwrap();
        let (markers, stats) = build_markers(&axis, &[pos], 120_000);
        assert_eq!(markers.len(), 3);
        assert_eq!(stats.matched, 3);
        let below = markers
            .iter()
            .filter(|m| m.position == MarkerPosition::BelowBar)
            .count();
        assert_eq!(below, 2);
        assert_eq!(markers[0].text, "FIRST 10.00");
        assert_eq!(markers[1].text, "SECOND 9.00");
        assert_eq!(markers[1].time, 120);
        assert_eq!(markers[2].text, "EXIT 11.00");
        assert_eq!(markers[2].color, PROFIT_COLOR);
        assert_eq!(markers[2].id, "42-exit");
    }

    #[test]
    fn ordinals_past_third() {
        assert_eq!(ordinal(3), "ENTRY 4");
    }
}
