//! candela-http
//!
//! Production connector that implements `CandelaConnector` over the trading
//! API's bearer-authenticated JSON endpoints: paginated candles, position
//! history, raw signals and channel history.
#![warn(missing_docs)]

mod builder;
mod client;
/// Response decoding for the upstream's candle and channel shapes.
pub mod wire;

use async_trait::async_trait;

use candela_core::connector::{
    CandelaConnector, CandleProvider, CandleRequest, ChannelHistoryProvider,
    PositionHistoryProvider, SignalProvider,
};
use candela_core::upstream::SignalRecord;
use candela_core::{
    Candle, Capability, CandelaError, ChannelPoint, Credentials, PositionPayload,
};

pub use builder::HttpConnectorBuilder;
pub use client::Endpoints;

/// Connector for the upstream trading API.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    api: client::ApiClient,
    max_bars_per_request: u32,
}

impl HttpConnector {
    /// Stable connector name used in logs and errors.
    pub const NAME: &'static str = "candela-http";
}

#[async_trait]
impl CandleProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candela_http::candles",
            skip(self, auth),
            fields(
                symbol = %req.symbol,
                resolution = %req.resolution,
                start = req.start_ms,
                end = req.end_ms,
            ),
        )
    )]
    async fn candles(
        &self,
        auth: &Credentials,
        req: &CandleRequest,
    ) -> Result<Vec<Candle>, CandelaError> {
        let url = self.api.url(&self.api.endpoints.candles, None)?;
        let limit = req.limit.min(self.max_bars_per_request);
        let query = [
            ("symbol", req.symbol.clone()),
            ("interval", req.resolution.as_str().to_string()),
            ("startTime", req.start_ms.to_string()),
            // inclusive on the wire
            ("endTime", (req.end_ms - 1).to_string()),
            ("limit", limit.to_string()),
        ];
        let body = self
            .api
            .get_json(auth, url, &query, Capability::Candles)
            .await?;
        let mut candles = wire::parse_candles(body)?;
        candles.retain(|c| c.original_time >= req.start_ms && c.original_time < req.end_ms);
        candles.truncate(limit as usize);
        Ok(candles)
    }

    fn max_bars_per_request(&self) -> u32 {
        self.max_bars_per_request
    }
}

#[async_trait]
impl PositionHistoryProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "candela_http::position_history", skip(self, auth))
    )]
    async fn position_history(
        &self,
        auth: &Credentials,
        instance_id: &str,
    ) -> Result<PositionPayload, CandelaError> {
        let url = self
            .api
            .url(&self.api.endpoints.position_history, Some(instance_id))?;
        let body = self
            .api
            .get_json(auth, url, &[], Capability::PositionHistory)
            .await?;
        PositionPayload::detect(body)
    }
}

#[async_trait]
impl SignalProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "candela_http::signals", skip(self, auth))
    )]
    async fn signals(
        &self,
        auth: &Credentials,
        instance_id: &str,
    ) -> Result<Vec<SignalRecord>, CandelaError> {
        let url = self.api.url(&self.api.endpoints.signals, Some(instance_id))?;
        let body = self
            .api
            .get_json(auth, url, &[], Capability::Signals)
            .await?;
        match PositionPayload::detect(body)? {
            PositionPayload::Signals(records) => Ok(records),
            PositionPayload::Aggregated(records) if records.is_empty() => Ok(Vec::new()),
            PositionPayload::Aggregated(_) => Err(CandelaError::Data(
                "signals endpoint returned aggregated positions".into(),
            )),
        }
    }
}

#[async_trait]
impl ChannelHistoryProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "candela_http::channel_history", skip(self, auth))
    )]
    async fn channel_history(
        &self,
        auth: &Credentials,
        instance_id: &str,
        days: u32,
    ) -> Result<Vec<ChannelPoint>, CandelaError> {
        let url = self
            .api
            .url(&self.api.endpoints.channel_history, Some(instance_id))?;
        let body = self
            .api
            .get_json(auth, url, &[("days", days.to_string())], Capability::ChannelHistory)
            .await?;
        wire::parse_channel(body, Self::NAME)
    }
}

impl CandelaConnector for HttpConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "Trading API"
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
