// Shared fixtures for the orchestrator tests; each test binary uses a subset.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use candela::{
    Candela, CandelaBuilder, CandelaError, ChartBundle, InstanceParams, RenderSink, Resolution,
};
use candela_core::Candle;
use candela_mock::{FIXTURE_END_MS, MockConnector};

pub const DAY_MS: i64 = 86_400_000;
pub const HOUR_MS: i64 = 3_600_000;
pub const MINUTE_MS: i64 = 60_000;

pub const BTC: &str = "BTCUSDT";
pub const TOKEN: &str = "test-token";

/// Two days of 1m bars ending at the fixture anchor, 1h indicator, EMA(20).
pub fn two_day_params(instance: &str, symbol: &str) -> InstanceParams {
    InstanceParams {
        instance_id: instance.to_string(),
        symbol: symbol.to_string(),
        fine: Resolution::M1,
        coarse: Resolution::H1,
        range_start_ms: FIXTURE_END_MS - 2 * DAY_MS,
        range_end_ms: FIXTURE_END_MS,
        ema_periods: 20,
        channel_days: 2,
    }
}

pub fn mock_builder() -> CandelaBuilder {
    Candela::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .bearer_token(TOKEN)
}

pub fn mock_candela() -> Candela {
    mock_builder().build().expect("build candela")
}

/// Contiguous flat bars opening at `start_ms`.
pub fn flat_series(start_ms: i64, step_ms: i64, n: i64, price: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle::new(start_ms + i * step_ms, price, price, price, price, 1.0))
        .collect()
}

pub fn assert_strictly_increasing(times: impl IntoIterator<Item = i64>) {
    let times: Vec<i64> = times.into_iter().collect();
    assert!(
        times.windows(2).all(|w| w[0] < w[1]),
        "times not strictly increasing: {times:?}"
    );
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Teardown,
    Render { generation: u64, bars: usize },
}

/// Sink that records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl RenderSink for RecordingSink {
    async fn teardown(&mut self) {
        self.events
            .lock()
            .expect("events lock")
            .push(SinkEvent::Teardown);
    }

    async fn render(&mut self, bundle: ChartBundle) -> Result<(), CandelaError> {
        self.events.lock().expect("events lock").push(SinkEvent::Render {
            generation: bundle.report.generation,
            bars: bundle.price_series.len(),
        });
        Ok(())
    }
}
