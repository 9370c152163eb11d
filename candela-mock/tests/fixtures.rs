use candela_core::connector::{CandleProvider, CandleRequest};
use candela_core::{
    CandelaConnector, CandelaError, Credentials, PositionPayload, Resolution, normalize_positions,
};
use candela_mock::{FIXTURE_END_MS, MockConnector};

fn auth() -> Credentials {
    Credentials::bearer("t")
}

fn req(symbol: &str, start_ms: i64, end_ms: i64, limit: u32) -> CandleRequest {
    CandleRequest {
        symbol: symbol.into(),
        resolution: Resolution::M1,
        start_ms,
        end_ms,
        limit,
    }
}

#[tokio::test]
async fn pages_respect_window_and_limit() {
    let m = MockConnector::new();
    let start = FIXTURE_END_MS - 3_600_000 + 30_000;
    let got = m
        .candles(&auth(), &req("BTCUSDT", start, FIXTURE_END_MS, 10))
        .await
        .unwrap();
    assert_eq!(got.len(), 10);
    assert!(got.iter().all(|c| c.original_time >= start));
    assert_eq!(got[0].original_time % 60_000, 0);
}

#[tokio::test]
async fn overlapping_pages_agree() {
    let m = MockConnector::new();
    let a = m
        .candles(&auth(), &req("ETHUSDT", 0, 600_000, 1000))
        .await
        .unwrap();
    let b = m
        .candles(&auth(), &req("ETHUSDT", 300_000, 900_000, 1000))
        .await
        .unwrap();
    assert_eq!(a[5..], b[..5]);
}

#[tokio::test]
async fn forced_failures() {
    let m = MockConnector::new();
    let err = m
        .candles(&auth(), &req("FAIL", 0, 60_000, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CandelaError::Connector { .. }));
    let err = m
        .candles(&Credentials::bearer(""), &req("BTCUSDT", 0, 60_000, 1))
        .await
        .unwrap_err();
    assert_eq!(err, CandelaError::MissingCredentials);
}

#[tokio::test]
async fn signals_and_history_describe_the_same_trades() {
    let m = MockConnector::new();
    let history = m
        .as_position_history_provider()
        .unwrap()
        .position_history(&auth(), "demo")
        .await
        .unwrap();
    let signals = m
        .as_signal_provider()
        .unwrap()
        .signals(&auth(), "demo")
        .await
        .unwrap();
    let from_history = normalize_positions(&history);
    let from_signals = normalize_positions(&PositionPayload::Signals(signals));
    assert_eq!(from_history.len(), 3);
    let ids = |v: &[candela_core::Position]| v.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&from_history), ids(&from_signals));
    for (h, s) in from_history.iter().zip(&from_signals) {
        assert_eq!(h.entries, s.entries);
        assert_eq!(h.status, s.status);
        assert!((h.entry_price - s.entry_price).abs() < 1e-6);
    }
}

#[tokio::test]
async fn signals_only_instance_has_empty_history() {
    let m = MockConnector::new();
    let history = m
        .as_position_history_provider()
        .unwrap()
        .position_history(&auth(), "signals-only")
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn channel_covers_requested_days() {
    let m = MockConnector::new();
    let pts = m
        .as_channel_history_provider()
        .unwrap()
        .channel_history(&auth(), "demo", 2)
        .await
        .unwrap();
    assert_eq!(pts.len(), 2 * 24 * 4);
    assert!(pts.iter().all(|p| p.upper_band > p.lower_band));
    assert!(pts.windows(2).all(|w| w[0].time < w[1].time));
}
