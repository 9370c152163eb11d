//! Re-export of foundational types from `candela-types` and the core model.
// Consolidated re-exports so downstream crates can depend on `candela-core` only

pub use candela_types::{
    AlignmentConfig, AlignmentStats, Capability, CandelaError, Credentials, FetchConfig, Gap,
    InstanceParams, PacingConfig, PipelineConfig, PipelineReport, PositionsSource, Resolution,
    SeriesReport,
};

pub use crate::model::{
    Candle, ChannelPoint, Entry, Exit, IndicatorPoint, LinePoint, Marker, MarkerPosition,
    MarkerShape, Position, PositionStatus, PriceBar, Timestamped,
};
pub use crate::upstream::{AggregatedPosition, EntryRecord, SignalKind, SignalRecord};
