mod helpers;

use std::sync::Arc;
use std::time::Duration;

use candela::{Candela, CandelaError, Gap, MarkerPosition, PositionsSource, Resolution};
use candela_core::PositionPayload;
use candela_mock::{DynamicMockConnector, DynamicMockController, FIXTURE_END_MS, MockBehavior};
use helpers::*;

#[tokio::test(start_paused = true)]
async fn full_run_on_fixtures() {
    let candela = mock_candela();
    let bundle = candela
        .run_pipeline(&two_day_params("7", BTC))
        .await
        .expect("pipeline ok");
    let report = &bundle.report;

    assert_eq!(bundle.price_series.len(), 2880);
    assert_eq!(report.fine.fragments_planned, 3);
    assert_eq!(report.fine.fragments_failed, 0);
    assert!(report.fine.gaps.is_empty());
    assert_eq!(report.fine.observed_step_ms, Some(MINUTE_MS));

    // 68 coarse bars incl. 20h warm-up; the first EMA value sits an hour
    // before the visible range and misses the axis.
    assert_eq!(report.coarse.candles, 68);
    assert!(!report.coarse_resampled);
    assert_eq!(bundle.indicator.len(), 48);
    assert_eq!(report.indicator.matched, 48);
    assert_eq!(report.indicator.missed, 1);

    assert_eq!(bundle.upper_band.len(), 192);
    assert_eq!(bundle.lower_band.len(), 192);
    assert!(
        bundle
            .upper_band
            .iter()
            .zip(&bundle.lower_band)
            .all(|(u, l)| u.time == l.time && u.value > l.value)
    );

    assert_eq!(report.positions_source, PositionsSource::History);
    assert_eq!(report.positions, 3);
    assert_eq!(bundle.markers.len(), 8);
    assert_eq!(report.markers.matched, 8);
    let below = bundle
        .markers
        .iter()
        .filter(|m| m.position == MarkerPosition::BelowBar)
        .count();
    assert_eq!(below, 6);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    assert_strictly_increasing(bundle.price_series.iter().map(|b| b.time));
    assert_strictly_increasing(bundle.indicator.iter().map(|p| p.time));
    assert_strictly_increasing(bundle.upper_band.iter().map(|p| p.time));
    let axis: std::collections::HashSet<i64> =
        bundle.price_series.iter().map(|b| b.time).collect();
    assert!(bundle.indicator.iter().all(|p| axis.contains(&p.time)));
    assert!(bundle.markers.iter().all(|m| axis.contains(&m.time)));
}

#[tokio::test(start_paused = true)]
async fn two_entries_and_an_exit_yield_three_markers() {
    let bundle = mock_candela()
        .run_pipeline(&two_day_params("7", BTC))
        .await
        .expect("pipeline ok");
    let trade: Vec<_> = bundle
        .markers
        .iter()
        .filter(|m| m.id.starts_with("101-"))
        .collect();
    assert_eq!(trade.len(), 3);
    assert_eq!(
        trade
            .iter()
            .filter(|m| m.position == MarkerPosition::AboveBar)
            .count(),
        1
    );
    assert!(trade.iter().any(|m| m.text.starts_with("FIRST ")));
    assert!(trade.iter().any(|m| m.text.starts_with("SECOND ")));
    assert!(trade.iter().any(|m| m.text.starts_with("EXIT ")));
}

#[tokio::test(start_paused = true)]
async fn missing_token_fails_before_any_call() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("dyn");
    let candela = Candela::builder().with_connector(mock).build().unwrap();
    let err = candela
        .run_pipeline(&two_day_params("7", "X"))
        .await
        .unwrap_err();
    assert_eq!(err, CandelaError::MissingCredentials);
    assert!(err.is_fatal());
    assert!(controller.candle_requests().await.is_empty());
    assert_eq!(controller.instance_calls().await, (0, 0, 0));

    let blank = Candela::builder()
        .with_connector(Arc::new(candela_mock::MockConnector::new()))
        .bearer_token("   ")
        .build()
        .unwrap();
    assert_eq!(
        blank.run_pipeline(&two_day_params("7", BTC)).await,
        Err(CandelaError::MissingCredentials)
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_params_are_rejected() {
    let mut params = two_day_params("7", BTC);
    params.range_end_ms = params.range_start_ms;
    let err = mock_candela().run_pipeline(&params).await.unwrap_err();
    assert!(matches!(err, CandelaError::InvalidArg(_)));
}

#[tokio::test(start_paused = true)]
async fn failing_reference_series_is_fatal() {
    let err = mock_candela()
        .run_pipeline(&two_day_params("7", "FAIL"))
        .await
        .unwrap_err();
    assert!(matches!(err, CandelaError::DataUnavailable { .. }), "{err:?}");
}

#[tokio::test(start_paused = true)]
async fn flaky_pages_degrade_and_coarse_falls_back() {
    let bundle = mock_candela()
        .run_pipeline(&two_day_params("7", "FLAKY"))
        .await
        .expect("partial data is not fatal");
    let report = &bundle.report;

    assert_eq!(report.fine.fragments_planned, 3);
    assert_eq!(report.fine.fragments_failed, 2);
    assert_eq!(bundle.price_series.len(), 1000);
    assert!(report.warnings.contains(&CandelaError::partial_fetch(
        "candles/FLAKY/1m",
        2,
        3
    )));

    // the only coarse page fails, so hourly bars come from the minutes
    assert!(report.coarse_resampled);
    assert!(report.coarse.candles > 0);
    assert!(
        report
            .warnings
            .iter()
            .any(|w| matches!(w, CandelaError::DataUnavailable { what } if what.contains("1h")))
    );
}

#[tokio::test(start_paused = true)]
async fn coarse_fallback_can_be_disabled() {
    let candela = mock_builder()
        .coarse_fallback_resample(false)
        .build()
        .unwrap();
    let bundle = candela
        .run_pipeline(&two_day_params("7", "FLAKY"))
        .await
        .unwrap();
    assert!(!bundle.report.coarse_resampled);
    assert!(bundle.indicator.is_empty());
    assert_eq!(bundle.report.coarse.candles, 0);
}

#[tokio::test(start_paused = true)]
async fn missing_minutes_are_gaps_not_failures() {
    let bundle = mock_candela()
        .run_pipeline(&two_day_params("7", "GAPPY"))
        .await
        .expect("gaps are not fatal");
    let gaps = &bundle.report.fine.gaps;
    assert_eq!(gaps.len(), 30);
    assert!(gaps.iter().all(|g| g.missing_bars == 1));
    assert!(
        gaps.iter()
            .all(|g| g.before_ms - g.after_ms == 2 * MINUTE_MS)
    );
    assert_eq!(bundle.price_series.len(), 2880 - 30);
    assert_strictly_increasing(bundle.price_series.iter().map(|b| b.time));
}

#[tokio::test(start_paused = true)]
async fn signals_replace_empty_history() {
    let bundle = mock_candela()
        .run_pipeline(&two_day_params("signals-only", BTC))
        .await
        .unwrap();
    assert_eq!(bundle.report.positions_source, PositionsSource::Signals);
    assert_eq!(bundle.report.positions, 3);
    assert_eq!(bundle.markers.len(), 8);
}

#[tokio::test(start_paused = true)]
async fn empty_instance_renders_candles_only() {
    let bundle = mock_candela()
        .run_pipeline(&two_day_params("empty", BTC))
        .await
        .unwrap();
    assert_eq!(bundle.price_series.len(), 2880);
    assert!(bundle.markers.is_empty());
    assert!(bundle.upper_band.is_empty());
    assert!(bundle.lower_band.is_empty());
    assert!(!bundle.indicator.is_empty());
    assert_eq!(bundle.report.positions_source, PositionsSource::None);
    assert!(bundle.report.warnings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn channel_failure_leaves_bands_empty() {
    let bundle = mock_candela()
        .run_pipeline(&two_day_params("no-channel", BTC))
        .await
        .unwrap();
    assert!(bundle.upper_band.is_empty());
    assert!(bundle.lower_band.is_empty());
    assert_eq!(bundle.markers.len(), 8);
    assert!(bundle.report.warnings.iter().any(|w| matches!(
        w,
        CandelaError::Connector { connector, .. } if connector == "candela-mock"
    )));
}

#[tokio::test(start_paused = true)]
async fn hanging_instance_endpoints_time_out() {
    let candela = mock_builder()
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let bundle = candela
        .run_pipeline(&two_day_params("TIMEOUT", BTC))
        .await
        .expect("auxiliary timeouts are not fatal");
    let mut timeouts: Vec<_> = bundle
        .report
        .warnings
        .iter()
        .filter_map(|w| match w {
            CandelaError::FetchTimeout { capability, .. } => Some(capability.as_str()),
            _ => None,
        })
        .collect();
    timeouts.sort_unstable();
    assert_eq!(timeouts, ["channel-history", "position-history", "signals"]);
    assert!(bundle.markers.is_empty());
    assert!(bundle.upper_band.is_empty());
    assert_eq!(bundle.price_series.len(), 2880);
}

// ---------- dynamic connector ----------

const X: &str = "X";

async fn dynamic_candela(min_interval: Duration) -> (Candela, DynamicMockController) {
    let (mock, controller) = DynamicMockConnector::new_with_controller("dyn");
    let params = two_day_params("7", X);
    controller
        .set_candle_behavior(
            Resolution::M1,
            MockBehavior::Return(flat_series(params.range_start_ms, MINUTE_MS, 2880, 100.0)),
        )
        .await;
    controller
        .set_candle_behavior(
            Resolution::H1,
            MockBehavior::Return(flat_series(params.coarse_start_ms(), HOUR_MS, 68, 100.0)),
        )
        .await;
    controller
        .set_position_behavior(MockBehavior::Return(PositionPayload::default()))
        .await;
    controller
        .set_signal_behavior(MockBehavior::Return(Vec::new()))
        .await;
    controller
        .set_channel_behavior(MockBehavior::Return(Vec::new()))
        .await;
    let candela = Candela::builder()
        .with_connector(mock)
        .bearer_token(TOKEN)
        .min_request_interval(min_interval)
        .build()
        .unwrap();
    (candela, controller)
}

#[tokio::test(start_paused = true)]
async fn fragment_requests_are_sequential_and_paced() {
    let (candela, controller) = dynamic_candela(Duration::from_secs(2)).await;
    let params = two_day_params("7", X);
    candela.run_pipeline(&params).await.unwrap();

    let fine: Vec<_> = controller
        .candle_requests()
        .await
        .into_iter()
        .filter(|(_, r)| r.resolution == Resolution::M1)
        .collect();
    assert_eq!(fine.len(), 3);
    for w in fine.windows(2) {
        assert!(w[1].0 - w[0].0 >= Duration::from_secs(2));
        assert_eq!(w[1].1.start_ms, w[0].1.end_ms);
    }
    assert_eq!(fine[0].1.start_ms, params.range_start_ms);
    assert_eq!(fine[2].1.end_ms, params.range_end_ms);
    assert!(fine.iter().all(|(_, r)| r.limit == 1000));
}

#[tokio::test(start_paused = true)]
async fn pause_is_measured_from_the_end_of_a_slow_request() {
    let (candela, controller) = dynamic_candela(Duration::from_secs(1)).await;
    controller
        .set_candle_latency(Duration::from_millis(1_500))
        .await;
    let params = two_day_params("7", X);
    let series = candela
        .fetch_series(X, Resolution::M1, params.range_start_ms, params.range_end_ms)
        .await
        .unwrap();
    assert_eq!(series.report.fragments_planned, 3);
    assert_eq!(series.candles.len(), 2880);

    let starts: Vec<_> = controller
        .candle_requests()
        .await
        .into_iter()
        .map(|(at, _)| at)
        .collect();
    assert_eq!(starts.len(), 3);
    for w in starts.windows(2) {
        // 1.5 s in flight plus a full 1 s pause after it finished
        assert!(w[1] - w[0] >= Duration::from_millis(2_500));
    }
}

#[tokio::test(start_paused = true)]
async fn request_cap_follows_builder() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .set_candle_behavior(
            Resolution::M1,
            MockBehavior::Return(flat_series(0, MINUTE_MS, 2880, 1.0)),
        )
        .await;
    let candela = Candela::builder()
        .with_connector(mock)
        .bearer_token(TOKEN)
        .max_bars_per_request(500)
        .build()
        .unwrap();
    let series = candela
        .fetch_series(X, Resolution::M1, 0, 2 * DAY_MS)
        .await
        .unwrap();
    assert_eq!(series.report.fragments_planned, 6);
    assert_eq!(series.candles.len(), 2880);
    assert!(series.warnings.is_empty());
    assert!(
        controller
            .candle_requests()
            .await
            .iter()
            .all(|(_, r)| r.limit == 500)
    );
}

#[tokio::test(start_paused = true)]
async fn failed_fragment_becomes_one_gap() {
    let (candela, controller) = dynamic_candela(Duration::from_secs(1)).await;
    let params = two_day_params("7", X);
    let second = params.range_start_ms + 1000 * MINUTE_MS;
    controller.fail_candle_page(Resolution::M1, second).await;

    let bundle = candela.run_pipeline(&params).await.unwrap();
    let fine = &bundle.report.fine;
    assert_eq!(fine.fragments_failed, 1);
    assert_eq!(
        fine.gaps,
        vec![Gap {
            after_ms: second - MINUTE_MS,
            before_ms: second + 1000 * MINUTE_MS,
            missing_bars: 1000,
        }]
    );
    assert_eq!(bundle.price_series.len(), 1880);
    assert!(
        bundle
            .report
            .warnings
            .contains(&CandelaError::partial_fetch("candles/X/1m", 1, 3))
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_coarse_series_is_resampled_from_fine() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("dyn");
    let params = two_day_params("7", X);
    controller
        .set_candle_behavior(
            Resolution::M1,
            MockBehavior::Return(flat_series(params.range_start_ms, MINUTE_MS, 2880, 100.0)),
        )
        .await;
    controller
        .set_candle_behavior(Resolution::H1, MockBehavior::Hang)
        .await;
    let candela = Candela::builder()
        .with_connector(mock)
        .bearer_token(TOKEN)
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let bundle = candela.run_pipeline(&params).await.unwrap();
    assert!(bundle.report.coarse_resampled);
    assert_eq!(bundle.report.coarse.candles, 48);
    // 48 hourly bars, EMA(20) starts at the 20th
    assert_eq!(bundle.indicator.len(), 29);
    assert!(bundle.indicator.iter().all(|p| (p.value - 100.0).abs() < 1e-9));
    // unconfigured instance endpoints degrade to warnings
    assert!(
        bundle
            .report
            .warnings
            .iter()
            .any(|w| matches!(
                w,
                CandelaError::Unsupported { capability } if capability == "channel-history"
            ))
    );
}

#[tokio::test(start_paused = true)]
async fn history_failure_falls_back_to_signals() {
    let (candela, controller) = dynamic_candela(Duration::from_secs(1)).await;
    controller
        .set_position_behavior(MockBehavior::Fail(CandelaError::Http {
            status: 500,
            msg: "boom".into(),
        }))
        .await;
    controller
        .set_signal_behavior(MockBehavior::Return(candela_mock::fixtures::instance::signals(
            X,
            FIXTURE_END_MS,
        )))
        .await;

    let bundle = candela.run_pipeline(&two_day_params("7", X)).await.unwrap();
    assert_eq!(bundle.report.positions_source, PositionsSource::Signals);
    assert_eq!(bundle.report.positions, 3);
    assert_eq!(bundle.markers.len(), 8);
    assert!(
        bundle
            .report
            .warnings
            .iter()
            .any(|w| matches!(w, CandelaError::Http { status: 500, .. }))
    );
    assert_eq!(controller.instance_calls().await, (1, 1, 1));
}

#[tokio::test(start_paused = true)]
async fn no_candle_provider_is_data_unavailable() {
    let (mock, _controller) = DynamicMockConnector::new_with_controller("dyn");
    let candela = Candela::builder()
        .with_connector(mock)
        .bearer_token(TOKEN)
        .build()
        .unwrap();
    let err = candela
        .run_pipeline(&two_day_params("7", X))
        .await
        .unwrap_err();
    assert!(matches!(err, CandelaError::DataUnavailable { .. }));
}
