use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use candela_core::connector::{
    CandelaConnector, CandleProvider, CandleRequest, ChannelHistoryProvider,
    PositionHistoryProvider, SignalProvider,
};
use candela_core::{
    Candle, CandelaError, ChannelPoint, Credentials, PositionPayload, Resolution, SignalRecord,
};

/// Instruction for how a method should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(CandelaError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct InternalState {
    candle_rules: HashMap<Resolution, MockBehavior<Vec<Candle>>>,
    failing_pages: HashSet<(Resolution, i64)>,
    candle_latency: Duration,
    position_rule: Option<MockBehavior<PositionPayload>>,
    signal_rule: Option<MockBehavior<Vec<SignalRecord>>>,
    channel_rule: Option<MockBehavior<Vec<ChannelPoint>>>,
    candle_requests: Vec<(Instant, CandleRequest)>,
    position_calls: usize,
    signal_calls: usize,
    channel_calls: usize,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for candle calls at `resolution`.
    ///
    /// A `Return` series is served page by page: each request gets the bars
    /// inside its window, capped at its limit.
    pub async fn set_candle_behavior(
        &self,
        resolution: Resolution,
        behavior: MockBehavior<Vec<Candle>>,
    ) {
        let mut guard = self.state.lock().await;
        guard.candle_rules.insert(resolution, behavior);
    }

    /// Make the page starting exactly at `start_ms` fail with a 502.
    pub async fn fail_candle_page(&self, resolution: Resolution, start_ms: i64) {
        let mut guard = self.state.lock().await;
        guard.failing_pages.insert((resolution, start_ms));
    }

    /// Delay every candle response by `latency`, successful or not.
    pub async fn set_candle_latency(&self, latency: Duration) {
        self.state.lock().await.candle_latency = latency;
    }

    /// Set the behavior for position history calls.
    pub async fn set_position_behavior(&self, behavior: MockBehavior<PositionPayload>) {
        self.state.lock().await.position_rule = Some(behavior);
    }

    /// Set the behavior for signal calls.
    pub async fn set_signal_behavior(&self, behavior: MockBehavior<Vec<SignalRecord>>) {
        self.state.lock().await.signal_rule = Some(behavior);
    }

    /// Set the behavior for channel history calls.
    pub async fn set_channel_behavior(&self, behavior: MockBehavior<Vec<ChannelPoint>>) {
        self.state.lock().await.channel_rule = Some(behavior);
    }

    /// Candle requests received so far, with the instant each arrived.
    pub async fn candle_requests(&self) -> Vec<(Instant, CandleRequest)> {
        self.state.lock().await.candle_requests.clone()
    }

    /// Calls received per instance endpoint: (positions, signals, channel).
    pub async fn instance_calls(&self) -> (usize, usize, usize) {
        let guard = self.state.lock().await;
        (guard.position_calls, guard.signal_calls, guard.channel_calls)
    }

    /// Clear all configured behaviors and request logs.
    pub async fn clear_all_behaviors(&self) {
        *self.state.lock().await = InternalState::default();
    }
}

/// A connector that defers all behavior to an external controller.
///
/// Endpoints without a configured behavior fail with `Unsupported`.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn CandelaConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn CandelaConnector>, controller)
    }
}

async fn resolve<T>(
    behavior: Option<MockBehavior<T>>,
    capability: &str,
) -> Result<T, CandelaError> {
    match behavior {
        Some(MockBehavior::Return(v)) => Ok(v),
        Some(MockBehavior::Fail(e)) => Err(e),
        Some(MockBehavior::Hang) => std::future::pending().await,
        None => Err(CandelaError::unsupported(capability)),
    }
}

impl CandelaConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
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

#[async_trait]
impl CandleProvider for DynamicMockConnector {
    async fn candles(
        &self,
        _auth: &Credentials,
        req: &CandleRequest,
    ) -> Result<Vec<Candle>, CandelaError> {
        // Acquire behavior snapshot without holding the lock across await points
        let (behavior, fail_page, latency) = {
            let mut guard = self.state.lock().await;
            guard.candle_requests.push((Instant::now(), req.clone()));
            (
                guard.candle_rules.get(&req.resolution).cloned(),
                guard.failing_pages.contains(&(req.resolution, req.start_ms)),
                guard.candle_latency,
            )
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if fail_page {
            return Err(CandelaError::Http {
                status: 502,
                msg: format!("{}: page at {} failed", self.name, req.start_ms),
            });
        }
        let series = resolve(behavior, "candles").await?;
        Ok(series
            .into_iter()
            .filter(|c| c.original_time >= req.start_ms && c.original_time < req.end_ms)
            .take(req.limit as usize)
            .collect())
    }
}

#[async_trait]
impl PositionHistoryProvider for DynamicMockConnector {
    async fn position_history(
        &self,
        _auth: &Credentials,
        _instance_id: &str,
    ) -> Result<PositionPayload, CandelaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.position_calls += 1;
            guard.position_rule.clone()
        };
        resolve(behavior, "position-history").await
    }
}

#[async_trait]
impl SignalProvider for DynamicMockConnector {
    async fn signals(
        &self,
        _auth: &Credentials,
        _instance_id: &str,
    ) -> Result<Vec<SignalRecord>, CandelaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.signal_calls += 1;
            guard.signal_rule.clone()
        };
        resolve(behavior, "signals").await
    }
}

#[async_trait]
impl ChannelHistoryProvider for DynamicMockConnector {
    async fn channel_history(
        &self,
        _auth: &Credentials,
        _instance_id: &str,
        _days: u32,
    ) -> Result<Vec<ChannelPoint>, CandelaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.channel_calls += 1;
            guard.channel_rule.clone()
        };
        resolve(behavior, "channel-history").await
    }
}
