use async_trait::async_trait;

use crate::model::{Candle, ChannelPoint};
use crate::normalize::PositionPayload;
use crate::timeseries::fragment::Fragment;
use crate::upstream::SignalRecord;
use candela_types::{CandelaError, Capability, Credentials, Resolution};

/// One page of candles to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    /// Market symbol.
    pub symbol: String,
    /// Bar resolution.
    pub resolution: Resolution,
    /// Inclusive start (ms since epoch).
    pub start_ms: i64,
    /// Exclusive end (ms since epoch).
    pub end_ms: i64,
    /// Item cap for this request.
    pub limit: u32,
}

impl CandleRequest {
    /// Request covering exactly one planned fragment.
    pub fn for_fragment(symbol: impl Into<String>, fragment: &Fragment, limit: u32) -> Self {
        Self {
            symbol: symbol.into(),
            resolution: fragment.resolution,
            start_ms: fragment.start_ms,
            end_ms: fragment.end_ms,
            limit,
        }
    }
}

/// Focused role trait for connectors that serve paginated OHLCV candles.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Fetch one page of candles in `[req.start_ms, req.end_ms)`.
    ///
    /// Implementations return at most `req.limit` candles and may return them
    /// in any order; the merger sorts and deduplicates.
    async fn candles(
        &self,
        auth: &Credentials,
        req: &CandleRequest,
    ) -> Result<Vec<Candle>, CandelaError>;

    /// Largest page the upstream accepts. The orchestrator never asks for more.
    fn max_bars_per_request(&self) -> u32 {
        1000
    }
}

/// Focused role trait for connectors that serve aggregated position history.
#[async_trait]
pub trait PositionHistoryProvider: Send + Sync {
    /// Fetch the position history of an instance.
    ///
    /// The payload is returned in whichever shape the upstream produced.
    async fn position_history(
        &self,
        auth: &Credentials,
        instance_id: &str,
    ) -> Result<PositionPayload, CandelaError>;
}

/// Focused role trait for connectors that serve raw entry/exit signals.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Fetch every signal recorded for an instance.
    async fn signals(
        &self,
        auth: &Credentials,
        instance_id: &str,
    ) -> Result<Vec<SignalRecord>, CandelaError>;
}

/// Focused role trait for connectors that serve pre-computed channel bands.
#[async_trait]
pub trait ChannelHistoryProvider: Send + Sync {
    /// Fetch `days` days of channel history for an instance.
    async fn channel_history(
        &self,
        auth: &Credentials,
        instance_id: &str,
        days: u32,
    ) -> Result<Vec<ChannelPoint>, CandelaError>;
}

/// Primary connector interface.
///
/// A connector advertises each capability by returning a trait object from the
/// matching `as_*_provider` accessor. Unsupported capabilities keep the
/// default `None`.
pub trait CandelaConnector: Send + Sync {
    /// A stable identifier used in logs and errors (e.g. "candela-http").
    fn name(&self) -> &'static str;

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Advertise candle capability.
    fn as_candle_provider(&self) -> Option<&dyn CandleProvider> {
        None
    }

    /// Advertise position history capability.
    fn as_position_history_provider(&self) -> Option<&dyn PositionHistoryProvider> {
        None
    }

    /// Advertise signal capability.
    fn as_signal_provider(&self) -> Option<&dyn SignalProvider> {
        None
    }

    /// Advertise channel history capability.
    fn as_channel_history_provider(&self) -> Option<&dyn ChannelHistoryProvider> {
        None
    }

    /// Whether the connector advertises `cap`.
    fn supports(&self, cap: Capability) -> bool {
        match cap {
            Capability::Candles => self.as_candle_provider().is_some(),
            Capability::PositionHistory => self.as_position_history_provider().is_some(),
            Capability::Signals => self.as_signal_provider().is_some(),
            Capability::ChannelHistory => self.as_channel_history_provider().is_some(),
            _ => false,
        }
    }
}
