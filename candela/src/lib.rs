//! candela
//!
//! High-level orchestrator that turns a trading instance into a chart: one
//! reference candle series plus an EMA indicator, channel bands and
//! entry/exit markers, all snapped onto the same time axis.
//!
//! Overview
//! - Register one or more connectors implementing `candela_core::CandelaConnector`
//!   (see `candela-http` for the production API, `candela-mock` for fixtures).
//!   Each capability is served by the first connector that advertises it.
//! - Configure credentials, request caps, pacing, timeouts and alignment
//!   tolerance on the builder.
//! - Call [`Candela::run_pipeline`] for a one-off [`ChartBundle`], or drive a
//!   [`RenderSink`] through a [`ChartSession`] so newer runs supersede older
//!   ones.
//!
//! Degradation
//! - Candle ranges are fetched in capped fragments; failed fragments are
//!   skipped and show up as gaps plus a `PartialFetch` warning.
//! - Only an empty reference series, missing credentials or invalid
//!   parameters fail a run. Position, signal, channel and coarse-candle
//!   failures are recovered and listed in [`PipelineReport::warnings`].
//!
//! Quickstart
//! ```rust,ignore
//! use std::sync::Arc;
//! use candela::{Candela, InstanceParams};
//! use candela_mock::MockConnector;
//!
//! # async fn run() -> Result<(), candela::CandelaError> {
//! let candela = Candela::builder()
//!     .with_connector(Arc::new(MockConnector::new()))
//!     .bearer_token("demo")
//!     .build()?;
//! let params = InstanceParams::lookback("7", "BTCUSDT", 2);
//! let bundle = candela.run_pipeline(&params).await?;
//! println!("{} bars, {} markers", bundle.price_series.len(), bundle.markers.len());
//! # Ok(()) }
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod fetch;
mod pipeline;
mod session;

pub use crate::core::{Candela, CandelaBuilder};
pub use fetch::FetchedSeries;
pub use pipeline::ChartBundle;
pub use session::{ChartSession, RenderSink, RunToken};

pub use candela_core::{
    AlignmentConfig, AlignmentStats, CandelaConnector, CandelaError, Capability, Credentials,
    FetchConfig, Gap, InstanceParams, LinePoint, Marker, MarkerPosition, MarkerShape,
    PacingConfig, PipelineConfig, PipelineReport, PositionsSource, PriceBar, Resolution,
    SeriesReport,
};
