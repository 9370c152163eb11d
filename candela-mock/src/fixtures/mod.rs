//! Deterministic fixture data.
//!
//! Every value is a pure function of its inputs, so overlapping requests
//! agree bar for bar and repeated runs produce identical charts.

pub mod candles;
pub mod instance;

/// Default anchor: 2024-01-03T00:00:00Z. Instance fixtures sit in the two days before it.
pub const FIXTURE_END_MS: i64 = 1_704_240_000_000;

pub(crate) const HOUR_MS: i64 = 3_600_000;
pub(crate) const DAY_MS: i64 = 86_400_000;
