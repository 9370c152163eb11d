//! Configuration types shared by the orchestrator and connectors.

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CandelaError, Resolution};

/// Bearer credentials threaded explicitly into every upstream call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Raw bearer token (without the `Bearer ` prefix).
    pub bearer: String,
}

impl Credentials {
    /// Wrap a bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: token.into(),
        }
    }

    /// True when the token is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.bearer.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer", &"<redacted>")
            .finish()
    }
}

/// Fixed-delay pacing between sequential upstream requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause between the end of one request and the start of the next.
    pub min_interval: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
        }
    }
}

/// Settings for the fragmented candle fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request item cap honored when splitting a range into fragments.
    pub max_bars_per_request: u32,
    /// Pacing applied between fragment requests.
    pub pacing: PacingConfig,
    /// Upper bound on any single upstream call.
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_bars_per_request: 1000,
            pacing: PacingConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for snapping foreign timestamps onto the reference axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Maximum distance (ms) between a point and the reference bar it snaps to.
    pub tolerance_ms: i64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            tolerance_ms: 120_000,
        }
    }
}

/// Global configuration for the `Candela` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Credentials for the upstream API. Required before any fetch.
    pub credentials: Option<Credentials>,
    /// Fragmented fetch settings.
    pub fetch: FetchConfig,
    /// Alignment settings.
    pub alignment: AlignmentConfig,
    /// When the coarse fetch fails entirely, derive coarse bars from the fine series.
    pub coarse_fallback_resample: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            fetch: FetchConfig::default(),
            alignment: AlignmentConfig::default(),
            coarse_fallback_resample: true,
        }
    }
}

/// Parameters of one charted trading instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceParams {
    /// Upstream identifier of the trading instance (positions, signals, channel).
    pub instance_id: String,
    /// Market symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Reference (rendering) resolution.
    pub fine: Resolution,
    /// Indicator resolution.
    pub coarse: Resolution,
    /// Inclusive start of the charted range (ms since epoch).
    pub range_start_ms: i64,
    /// Exclusive end of the charted range (ms since epoch).
    pub range_end_ms: i64,
    /// EMA period count on the coarse series.
    pub ema_periods: usize,
    /// Days of channel history to request.
    pub channel_days: u32,
}

impl InstanceParams {
    /// Parameters covering the last `days` days up to now, with 1m/1h resolutions
    /// and a 20-period EMA.
    pub fn lookback(instance_id: impl Into<String>, symbol: impl Into<String>, days: u32) -> Self {
        let end = chrono::Utc::now();
        let start = end - chrono::TimeDelta::days(i64::from(days));
        Self {
            instance_id: instance_id.into(),
            symbol: symbol.into(),
            fine: Resolution::M1,
            coarse: Resolution::H1,
            range_start_ms: start.timestamp_millis(),
            range_end_ms: end.timestamp_millis(),
            ema_periods: 20,
            channel_days: days.max(1),
        }
    }

    /// Override the resolutions.
    #[must_use]
    pub const fn resolutions(mut self, fine: Resolution, coarse: Resolution) -> Self {
        self.fine = fine;
        self.coarse = coarse;
        self
    }

    /// Override the charted range.
    #[must_use]
    pub const fn range(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.range_start_ms = start_ms;
        self.range_end_ms = end_ms;
        self
    }

    /// Override the EMA period count.
    #[must_use]
    pub const fn ema_periods(mut self, periods: usize) -> Self {
        self.ema_periods = periods;
        self
    }

    /// Coarse fetch start: the range start pulled back by `ema_periods` coarse bars
    /// so the EMA is already seeded when the visible range begins.
    #[must_use]
    pub fn coarse_start_ms(&self) -> i64 {
        let warmup = i64::try_from(self.ema_periods).unwrap_or(i64::MAX);
        self.range_start_ms
            .saturating_sub(warmup.saturating_mul(self.coarse.as_millis()))
    }

    /// Validate the parameters.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty symbol or instance id, an empty range,
    /// or a zero EMA period.
    pub fn validate(&self) -> Result<(), CandelaError> {
        if self.symbol.trim().is_empty() {
            return Err(CandelaError::InvalidArg("symbol must not be empty".into()));
        }
        if self.instance_id.trim().is_empty() {
            return Err(CandelaError::InvalidArg(
                "instance id must not be empty".into(),
            ));
        }
        if self.range_start_ms >= self.range_end_ms {
            return Err(CandelaError::InvalidArg(format!(
                "empty range: start {} >= end {}",
                self.range_start_ms, self.range_end_ms
            )));
        }
        if self.ema_periods == 0 {
            return Err(CandelaError::InvalidArg("ema periods must be > 0".into()));
        }
        Ok(())
    }
}
