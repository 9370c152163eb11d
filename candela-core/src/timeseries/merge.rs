use std::collections::{BTreeMap, btree_map::Entry};

use crate::model::Candle;
use crate::timeseries::infer::{detect_gaps, estimate_step_ms};
use candela_types::{Gap, Resolution, SeriesReport};

/// A merged candle series plus what the merge discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSeries {
    /// Candles in strictly increasing `time` order.
    pub candles: Vec<Candle>,
    /// Candles dropped because an earlier fragment already covered their `time`.
    pub duplicates_dropped: usize,
    /// Candles dropped for non-finite prices or volume.
    pub non_finite_dropped: usize,
    /// Holes of at least one missing bar.
    pub gaps: Vec<Gap>,
}

impl MergedSeries {
    /// Summarize the merge for the run report.
    #[must_use]
    pub fn report(&self, fragments_planned: usize, fragments_failed: usize) -> SeriesReport {
        SeriesReport {
            fragments_planned,
            fragments_failed,
            candles: self.candles.len(),
            duplicates_dropped: self.duplicates_dropped,
            non_finite_dropped: self.non_finite_dropped,
            gaps: self.gaps.clone(),
            observed_step_ms: estimate_step_ms(&self.candles),
        }
    }

    /// True when no candles survived the merge.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Merge fetched fragments into one series.
///
/// - Candles are keyed by `time`; the first appearance (in fragment order)
///   wins for duplicates.
/// - Candles with non-finite values are dropped.
/// - The output is sorted ascending with no duplicate `time`.
/// - Gaps are reported, never filled.
pub fn merge_fragments<I>(fragments: I, resolution: Resolution) -> MergedSeries
where
    I: IntoIterator<Item = Vec<Candle>>,
{
    let mut map: BTreeMap<i64, Candle> = BTreeMap::new();
    let mut duplicates_dropped = 0usize;
    let mut non_finite_dropped = 0usize;
    for fragment in fragments {
        for c in fragment {
            if !c.is_finite() {
                non_finite_dropped += 1;
                continue;
            }
            match map.entry(c.time) {
                Entry::Vacant(v) => {
                    v.insert(c);
                }
                Entry::Occupied(_) => duplicates_dropped += 1,
            }
        }
    }
    let candles: Vec<Candle> = map.into_values().collect();
    let gaps = detect_gaps(&candles, resolution);

    #[cfg(feature = "tracing")]
    if let Some(step) = estimate_step_ms(&candles)
        && step != resolution.as_millis()
    {
        tracing::warn!(
            resolution = %resolution,
            observed_step_ms = step,
            "observed cadence differs from nominal resolution"
        );
    }

    #[cfg(feature = "tracing")]
    if duplicates_dropped > 0 || non_finite_dropped > 0 || !gaps.is_empty() {
        tracing::debug!(
            resolution = %resolution,
            candles = candles.len(),
            duplicates_dropped,
            non_finite_dropped,
            gaps = gaps.len(),
            "merged candle fragments"
        );
    }

    MergedSeries {
        candles,
        duplicates_dropped,
        non_finite_dropped,
        gaps,
    }
}
