//! candela-mock
//!
//! Connectors for tests and demos. `MockConnector` serves deterministic
//! fixtures keyed by symbol and instance id; `DynamicMockConnector` defers to
//! behaviors configured at runtime through a controller.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use candela_core::connector::{
    CandelaConnector, CandleProvider, CandleRequest, ChannelHistoryProvider,
    PositionHistoryProvider, SignalProvider,
};
use candela_core::{
    Candle, Capability, CandelaError, ChannelPoint, Credentials, PositionPayload, SignalRecord,
};

mod dynamic;
pub mod fixtures;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior};
pub use fixtures::FIXTURE_END_MS;

/// Mock connector with deterministic fixture data.
///
/// Special keys (symbols for candles, instance ids for the rest):
/// - `FAIL`: every call fails with a connector error.
/// - `TIMEOUT`: every call hangs until the caller's timeout fires.
/// - `FLAKY` (symbol): every other page of candles fails.
/// - `GAPPY` (symbol): a few bars are missing.
/// - `signals-only` (instance): empty position history, signals available.
/// - `empty` (instance): no positions, signals or channel samples.
/// - `no-channel` (instance): channel history fails.
#[derive(Debug, Clone)]
pub struct MockConnector {
    anchor_end_ms: i64,
    price_symbol: String,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Stable connector name.
    pub const NAME: &'static str = "candela-mock";

    /// Connector anchored at [`FIXTURE_END_MS`], pricing trades like `BTCUSDT`.
    #[must_use]
    pub fn new() -> Self {
        Self::anchored_at(FIXTURE_END_MS)
    }

    /// Connector whose instance fixtures end at `end_ms`.
    #[must_use]
    pub fn anchored_at(end_ms: i64) -> Self {
        Self {
            anchor_end_ms: end_ms - end_ms.rem_euclid(60_000),
            price_symbol: "BTCUSDT".into(),
        }
    }

    /// Connector whose instance fixtures end at the current minute.
    #[must_use]
    pub fn anchored_now() -> Self {
        Self::anchored_at(chrono::Utc::now().timestamp_millis())
    }

    /// Price positions and channel samples like `symbol`.
    #[must_use]
    pub fn with_price_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.price_symbol = symbol.into();
        self
    }

    /// End of the instance fixture window (ms since epoch).
    #[must_use]
    pub const fn anchor_end_ms(&self) -> i64 {
        self.anchor_end_ms
    }

    async fn maybe_fail_or_hang(key: &str, capability: Capability) -> Result<(), CandelaError> {
        match key {
            "FAIL" => Err(CandelaError::connector(
                Self::NAME,
                format!("forced failure: {capability}"),
            )),
            "TIMEOUT" => {
                // long enough for any configured timeout to win
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_auth(auth: &Credentials) -> Result<(), CandelaError> {
        if auth.is_blank() {
            Err(CandelaError::MissingCredentials)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CandleProvider for MockConnector {
    async fn candles(
        &self,
        auth: &Credentials,
        req: &CandleRequest,
    ) -> Result<Vec<Candle>, CandelaError> {
        Self::check_auth(auth)?;
        Self::maybe_fail_or_hang(&req.symbol, Capability::Candles).await?;
        let page = req.start_ms / req.resolution.as_millis() / i64::from(req.limit.max(1));
        if req.symbol == "FLAKY" && page.rem_euclid(2) == 1 {
            return Err(CandelaError::Http {
                status: 502,
                msg: format!("flaky page at {}", req.start_ms),
            });
        }
        Ok(fixtures::candles::candles(
            &req.symbol,
            req.resolution,
            req.start_ms,
            req.end_ms,
            req.limit,
        ))
    }
}

#[async_trait]
impl PositionHistoryProvider for MockConnector {
    async fn position_history(
        &self,
        auth: &Credentials,
        instance_id: &str,
    ) -> Result<PositionPayload, CandelaError> {
        Self::check_auth(auth)?;
        Self::maybe_fail_or_hang(instance_id, Capability::PositionHistory).await?;
        match instance_id {
            "signals-only" | "empty" => Ok(PositionPayload::default()),
            _ => Ok(PositionPayload::Aggregated(fixtures::instance::aggregated(
                &self.price_symbol,
                self.anchor_end_ms,
            ))),
        }
    }
}

#[async_trait]
impl SignalProvider for MockConnector {
    async fn signals(
        &self,
        auth: &Credentials,
        instance_id: &str,
    ) -> Result<Vec<SignalRecord>, CandelaError> {
        Self::check_auth(auth)?;
        Self::maybe_fail_or_hang(instance_id, Capability::Signals).await?;
        match instance_id {
            "empty" => Ok(Vec::new()),
            _ => Ok(fixtures::instance::signals(
                &self.price_symbol,
                self.anchor_end_ms,
            )),
        }
    }
}

#[async_trait]
impl ChannelHistoryProvider for MockConnector {
    async fn channel_history(
        &self,
        auth: &Credentials,
        instance_id: &str,
        days: u32,
    ) -> Result<Vec<ChannelPoint>, CandelaError> {
        Self::check_auth(auth)?;
        Self::maybe_fail_or_hang(instance_id, Capability::ChannelHistory).await?;
        match instance_id {
            "empty" => Ok(Vec::new()),
            "no-channel" => Err(CandelaError::connector(
                Self::NAME,
                "channel history unavailable",
            )),
            _ => Ok(fixtures::instance::channel(
                &self.price_symbol,
                self.anchor_end_ms,
                days,
            )),
        }
    }
}

impl CandelaConnector for MockConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn as_candle_provider(&self) -> Option<&dyn CandleProvider> {
        Some(self as &dyn CandleProvider)
    }

    fn as_position_history_provider(&self) -> Option<&dyn PositionHistoryProvider> {
        Some(self as &dyn PositionHistoryProvider)
    }

    fn as_signal_provider(&self) -> Option<&dyn SignalProvider> {
        Some(self as &dyn SignalProvider)
    }

    fn as_channel_history_provider(&self) -> Option<&dyn ChannelHistoryProvider> {
        Some(self as &dyn ChannelHistoryProvider)
    }
}
