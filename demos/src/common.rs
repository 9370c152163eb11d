use std::sync::Arc;

use async_trait::async_trait;
use candela::{CandelaError, ChartBundle, InstanceParams, RenderSink};
use candela_core::CandelaConnector;

/// Return a connector for demos.
///
/// Uses the HTTP connector against `CANDELA_API_URL` when it is set and
/// `CANDELA_DEMOS_USE_MOCK` is not; the mock connector otherwise.
///
/// # Errors
/// Returns `InvalidArg` when `CANDELA_API_URL` is not a valid http(s) URL.
pub fn get_connector() -> Result<Arc<dyn CandelaConnector>, CandelaError> {
    match std::env::var("CANDELA_API_URL") {
        Ok(url) if std::env::var("CANDELA_DEMOS_USE_MOCK").is_err() => {
            let http = candela_http::HttpConnector::builder(url).build()?;
            Ok(Arc::new(http))
        }
        _ => {
            println!("--- (Using Mock Connector) ---");
            Ok(Arc::new(candela_mock::MockConnector::anchored_now()))
        }
    }
}

/// Bearer token from `CANDELA_TOKEN`, or a placeholder accepted by the mock.
#[must_use]
pub fn token() -> String {
    std::env::var("CANDELA_TOKEN").unwrap_or_else(|_| "demo-token".to_string())
}

/// Two days of 1m bars for instance `CANDELA_INSTANCE` (default `7`) on
/// `CANDELA_SYMBOL` (default `BTCUSDT`).
#[must_use]
pub fn params() -> InstanceParams {
    let instance = std::env::var("CANDELA_INSTANCE").unwrap_or_else(|_| "7".to_string());
    let symbol = std::env::var("CANDELA_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string());
    InstanceParams::lookback(instance, symbol, 2)
}

/// Print a one-screen summary of a bundle.
pub fn print_bundle(bundle: &ChartBundle) {
    let r = &bundle.report;
    println!(
        "run {}: {} bars, {} indicator points, {} band points, {} markers",
        r.generation,
        bundle.price_series.len(),
        bundle.indicator.len(),
        bundle.upper_band.len(),
        bundle.markers.len()
    );
    println!(
        "  fine: {}/{} fragments ok, {} gaps; coarse: {} bars{}",
        r.fine.fragments_planned - r.fine.fragments_failed,
        r.fine.fragments_planned,
        r.fine.gaps.len(),
        r.coarse.candles,
        if r.coarse_resampled { " (resampled)" } else { "" }
    );
    println!(
        "  positions: {} from {:?}; alignment misses: indicator {}, channel {}, markers {}",
        r.positions,
        r.positions_source,
        r.indicator.missed + r.indicator.collisions,
        r.channel.missed + r.channel.collisions,
        r.markers.missed
    );
    for w in &r.warnings {
        println!("  warning: {w}");
    }
    for m in bundle.markers.iter().take(6) {
        let ts = chrono::DateTime::from_timestamp(m.time, 0)
            .map_or_else(|| m.time.to_string(), |t| t.to_rfc3339());
        println!("  {ts} {:<10} {}", m.id, m.text);
    }
}

/// Sink that prints every bundle it receives.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    rendered: usize,
}

impl ConsoleSink {
    /// Bundles rendered so far.
    #[must_use]
    pub const fn rendered(&self) -> usize {
        self.rendered
    }
}

#[async_trait]
impl RenderSink for ConsoleSink {
    async fn teardown(&mut self) {
        tracing::debug!(rendered = self.rendered, "teardown");
    }

    async fn render(&mut self, bundle: ChartBundle) -> Result<(), CandelaError> {
        self.rendered += 1;
        print_bundle(&bundle);
        Ok(())
    }
}
