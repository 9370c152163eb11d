use std::time::Duration;

use candela::{Candela, Resolution};
use candela_demos::common::{get_connector, token};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // GAPPY is a mock symbol with a few bars missing
    let symbol = std::env::var("CANDELA_SYMBOL").unwrap_or_else(|_| "GAPPY".to_string());
    let candela = Candela::builder()
        .with_connector(get_connector()?)
        .bearer_token(token())
        .max_bars_per_request(500)
        .min_request_interval(Duration::from_millis(100))
        .build()?;

    let end = chrono::Utc::now();
    let start = end - chrono::TimeDelta::days(1);
    let series = candela
        .fetch_series(
            &symbol,
            Resolution::M1,
            start.timestamp_millis(),
            end.timestamp_millis(),
        )
        .await?;

    let r = &series.report;
    println!(
        "{symbol}: {} candles from {} fragments ({} failed), step {:?} ms",
        r.candles, r.fragments_planned, r.fragments_failed, r.observed_step_ms
    );
    for gap in r.gaps.iter().take(5) {
        println!(
            "  gap: {} bar(s) missing between {} and {}",
            gap.missing_bars, gap.after_ms, gap.before_ms
        );
    }
    if r.gaps.len() > 5 {
        println!("  ... {} more", r.gaps.len() - 5);
    }
    Ok(())
}
