//! Candela-specific data transfer objects, configuration primitives and the
//! shared error type.
#![warn(missing_docs)]

mod capability;
mod config;
mod error;
mod reports;
mod resolution;

pub use capability::Capability;
pub use config::{
    AlignmentConfig, Credentials, FetchConfig, InstanceParams, PacingConfig, PipelineConfig,
};
pub use error::CandelaError;
pub use reports::{AlignmentStats, Gap, PipelineReport, PositionsSource, SeriesReport};
pub use resolution::Resolution;
