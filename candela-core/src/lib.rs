//! candela-core
//!
//! Domain model, connector traits, and pure time-series utilities shared
//! across the candela workspace.
//!
//! - `model`: candles, indicator/channel points, positions and chart markers.
//! - `upstream`: wire records as the trading API returns them.
//! - `connector`: the `CandelaConnector` trait and capability provider traits.
//! - `timeseries`: fragment planning, merging, gap inference, resampling,
//!   the EMA engine and time-axis alignment.
//! - `normalize`: position shape detection and normalization.
//! - `pacing`: fixed-delay pacing for sequential upstream requests.
//!
//! Async runtime (Tokio)
//! ---------------------
//! `pacing::Pacer` sleeps on `tokio::time`, so code that fetches through it
//! must run under a Tokio 1.x runtime. Everything under `timeseries` and
//! `normalize` is synchronous and deterministic.
#![warn(missing_docs)]

/// Connector capability traits and the primary `CandelaConnector` interface.
pub mod connector;
/// Domain types produced by the pipeline.
pub mod model;
/// Position shape detection and normalization.
pub mod normalize;
/// Request pacing.
pub mod pacing;
/// Time-series utilities: fragments, merge, gaps, resampling, EMA, alignment.
pub mod timeseries;
pub mod types;
/// Upstream wire records and lenient field decoders.
pub mod upstream;

pub use connector::CandelaConnector;
pub use normalize::{PositionPayload, normalize_allocation, normalize_positions};
pub use pacing::Pacer;
pub use timeseries::align::{Aligned, ReferenceAxis, align_points, build_markers, nearest_index};
pub use timeseries::fragment::{Fragment, plan_fragments};
pub use timeseries::indicator::compute_ema;
pub use timeseries::infer::{detect_gaps, estimate_step_ms};
pub use timeseries::merge::{MergedSeries, merge_fragments};
pub use timeseries::resample::resample_candles;
pub use types::*;
