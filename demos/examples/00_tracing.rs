use std::time::Duration;

use candela::Candela;
use candela_demos::common::{get_connector, params, token};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,candela=debug,candela_core=debug,candela_http=trace
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    let candela = Candela::builder()
        .with_connector(get_connector()?)
        .bearer_token(token())
        .min_request_interval(Duration::from_millis(250))
        .build()?;

    let bundle = candela.run_pipeline(&params()).await?;
    tracing::info!(
        bars = bundle.price_series.len(),
        markers = bundle.markers.len(),
        warnings = bundle.report.warnings.len(),
        "bundle ready"
    );
    println!("bars: {}", bundle.price_series.len());
    Ok(())
}
