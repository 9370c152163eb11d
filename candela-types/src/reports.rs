//! Report envelopes produced alongside pipeline bundles.

use serde::{Deserialize, Serialize};

use crate::error::CandelaError;

/// A timing hole between two consecutive bars of a merged series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Open time (ms) of the bar before the hole.
    pub after_ms: i64,
    /// Open time (ms) of the bar after the hole.
    pub before_ms: i64,
    /// Number of nominal bars that would fit into the hole.
    pub missing_bars: i64,
}

/// Outcome of fetching and merging one candle series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesReport {
    /// Fragments the range was split into.
    pub fragments_planned: usize,
    /// Fragments whose request failed and were skipped.
    pub fragments_failed: usize,
    /// Candles in the merged series.
    pub candles: usize,
    /// Candles dropped because an earlier fragment already had their timestamp.
    pub duplicates_dropped: usize,
    /// Candles dropped for carrying non-finite values.
    pub non_finite_dropped: usize,
    /// Holes of at least one whole missing bar.
    pub gaps: Vec<Gap>,
    /// Cadence observed in the data (ms), when it could be estimated.
    pub observed_step_ms: Option<i64>,
}

/// Aggregate result of snapping one source series onto the reference axis.
///
/// Individual misses are never surfaced; only these counts are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentStats {
    /// Points that landed on a reference bar.
    pub matched: usize,
    /// Points with no reference bar within tolerance.
    pub missed: usize,
    /// Points that lost a reference bar to a closer point.
    pub collisions: usize,
}

impl AlignmentStats {
    /// Total points considered.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.matched + self.missed + self.collisions
    }
}

/// Where the normalized positions of a run came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionsSource {
    /// The pre-aggregated position history endpoint.
    History,
    /// Reconstructed from raw entry/exit signals.
    Signals,
    /// Neither source produced usable records ("no transactions").
    #[default]
    None,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Run generation the bundle belongs to.
    pub generation: u64,
    /// Reference-resolution series.
    pub fine: SeriesReport,
    /// Indicator-resolution series.
    pub coarse: SeriesReport,
    /// True when the coarse series was derived from the fine one.
    pub coarse_resampled: bool,
    /// Indicator alignment.
    pub indicator: AlignmentStats,
    /// Channel alignment (both bands share the same source points).
    pub channel: AlignmentStats,
    /// Entry/exit marker alignment.
    pub markers: AlignmentStats,
    /// Origin of the positions.
    pub positions_source: PositionsSource,
    /// Number of normalized positions.
    pub positions: usize,
    /// Non-fatal issues encountered while building the bundle.
    pub warnings: Vec<CandelaError>,
}
