use std::sync::Arc;
use std::time::Duration;

use candela::{Candela, CandelaError, ChartSession};
use candela_demos::common::{ConsoleSink, get_connector, params, token};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let candela = Candela::builder()
        .with_connector(get_connector()?)
        .bearer_token(token())
        .min_request_interval(Duration::from_millis(250))
        .build()?;
    let session = ChartSession::new(Arc::new(candela), ConsoleSink::default());

    let first = params();
    let mut second = params();
    second.symbol = "ETHUSDT".to_string();

    // The user switches symbols before the first chart is ready: the first
    // run is superseded and never rendered.
    let (a, b) = tokio::join!(session.show(&first), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.show(&second).await
    });
    match a {
        Err(CandelaError::Superseded { generation }) => {
            println!("run {generation} superseded");
        }
        other => println!("first run: {other:?}"),
    }
    let report = b?;
    println!("run {} rendered", report.generation);
    println!("rendered bundles: {}", session.into_sink().rendered());
    Ok(())
}
