use candela_core::connector::CandleRequest;
use candela_core::{Candle, CandelaError, Credentials, PositionPayload, Resolution};
use candela_mock::{DynamicMockConnector, MockBehavior};

fn series(n: i64) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle::new(i * 60_000, 1.0, 1.0, 1.0, 1.0, 1.0))
        .collect()
}

fn req(start_ms: i64, end_ms: i64, limit: u32) -> CandleRequest {
    CandleRequest {
        symbol: "X".into(),
        resolution: Resolution::M1,
        start_ms,
        end_ms,
        limit,
    }
}

#[tokio::test]
async fn serves_windows_from_configured_series() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_candle_behavior(Resolution::M1, MockBehavior::Return(series(100)))
        .await;
    let cp = mock.as_candle_provider().expect("candle provider");
    let got = cp
        .candles(&Credentials::bearer("t"), &req(600_000, 1_200_000, 5))
        .await
        .expect("candles ok");
    assert_eq!(got.len(), 5);
    assert_eq!(got[0].original_time, 600_000);
    assert_eq!(controller.candle_requests().await.len(), 1);
}

#[tokio::test]
async fn failing_page_and_unconfigured_endpoints() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_candle_behavior(Resolution::M1, MockBehavior::Return(series(10)))
        .await;
    controller.fail_candle_page(Resolution::M1, 0).await;
    let cp = mock.as_candle_provider().expect("candle provider");
    let err = cp
        .candles(&Credentials::bearer("t"), &req(0, 60_000, 1))
        .await
        .expect_err("page fails");
    assert!(matches!(err, CandelaError::Http { status: 502, .. }));

    let err = mock
        .as_signal_provider()
        .expect("signal provider")
        .signals(&Credentials::bearer("t"), "1")
        .await
        .expect_err("unconfigured");
    assert!(matches!(err, CandelaError::Unsupported { .. }));
}

#[tokio::test]
async fn counts_instance_calls() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_position_behavior(MockBehavior::Return(PositionPayload::default()))
        .await;
    let pp = mock.as_position_history_provider().expect("positions");
    pp.position_history(&Credentials::bearer("t"), "1")
        .await
        .expect("ok");
    assert_eq!(controller.instance_calls().await, (1, 0, 0));
    controller.clear_all_behaviors().await;
    assert!(pp.position_history(&Credentials::bearer("t"), "1").await.is_err());
}
