//! Time-series utilities shared by connectors and orchestrator.
//!
//! Modules include:
//! - `fragment`: split a range into request-sized windows
//! - `merge`: merge fetched fragments into one ordered, deduplicated series
//! - `infer`: infer cadence and detect gaps
//! - `resample`: aggregate candles to a coarser resolution
//! - `indicator`: exponential moving average
//! - `align`: snap foreign timestamps onto the reference axis and build markers
/// Reference-axis alignment and marker generation.
pub mod align;
/// Range fragmentation for capped upstream requests.
pub mod fragment;
/// Exponential moving average.
pub mod indicator;
/// Cadence inference and gap detection.
pub mod infer;
/// First-wins merge of fetched fragments.
pub mod merge;
/// Resampling to coarser resolutions.
pub mod resample;
