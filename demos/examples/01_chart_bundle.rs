use std::time::Duration;

use candela::Candela;
use candela_demos::common::{get_connector, params, print_bundle, token};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let candela = Candela::builder()
        .with_connector(get_connector()?)
        .bearer_token(token())
        .min_request_interval(Duration::from_millis(250))
        .build()?;

    let params = params();
    println!(
        "instance {} on {}: {} bars with EMA({}) on {}",
        params.instance_id, params.symbol, params.fine, params.ema_periods, params.coarse
    );
    let bundle = candela.run_pipeline(&params).await?;
    print_bundle(&bundle);

    // the whole bundle is what a chart front end would consume
    let json = serde_json::to_string(&bundle)?;
    println!("bundle json: {} bytes", json.len());
    Ok(())
}
