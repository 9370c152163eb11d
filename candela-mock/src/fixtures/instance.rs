use candela_core::{
    AggregatedPosition, ChannelPoint, EntryRecord, Resolution, SignalKind, SignalRecord,
};

use super::candles::{candle_at, mid_price};
use super::{DAY_MS, HOUR_MS};

struct Trade {
    id: &'static str,
    entries: &'static [(i64, f64)],
    exit_hours_before_end: Option<i64>,
}

/// Hours before the anchor for each entry, with its allocation in percent.
const TRADES: [Trade; 3] = [
    Trade {
        id: "101",
        entries: &[(40, 60.0), (38, 40.0)],
        exit_hours_before_end: Some(30),
    },
    Trade {
        id: "102",
        entries: &[(20, 100.0)],
        exit_hours_before_end: Some(12),
    },
    Trade {
        id: "103",
        entries: &[(6, 50.0), (5, 30.0), (4, 20.0)],
        exit_hours_before_end: None,
    },
];

fn price_at(symbol: &str, ms: i64) -> f64 {
    candle_at(symbol, ms, Resolution::M1).close
}

fn weighted(symbol: &str, end_ms: i64, entries: &[(i64, f64)]) -> f64 {
    let total: f64 = entries.iter().map(|(_, a)| a).sum();
    entries
        .iter()
        .map(|(h, a)| price_at(symbol, end_ms - h * HOUR_MS) * a)
        .sum::<f64>()
        / total
}

fn profit(symbol: &str, end_ms: i64, t: &Trade, exit_ms: i64) -> (f64, f64) {
    let avg = weighted(symbol, end_ms, t.entries);
    let exit = price_at(symbol, exit_ms);
    (exit - avg, (exit - avg) / avg * 100.0)
}

/// Aggregated position history anchored at `end_ms`.
#[must_use]
pub fn aggregated(symbol: &str, end_ms: i64) -> Vec<AggregatedPosition> {
    TRADES
        .iter()
        .map(|t| {
            let exit_ms = t.exit_hours_before_end.map(|h| end_ms - h * HOUR_MS);
            let (profit, profit_percent) = match exit_ms {
                Some(x) => {
                    let (p, pct) = profit(symbol, end_ms, t, x);
                    (Some(p), Some(pct))
                }
                None => (None, None),
            };
            AggregatedPosition {
                id: t.id.to_string(),
                status: Some(if exit_ms.is_some() { "CLOSED" } else { "OPEN" }.to_string()),
                entries: t
                    .entries
                    .iter()
                    .map(|(h, a)| {
                        let ts = end_ms - h * HOUR_MS;
                        EntryRecord {
                            timestamp: ts,
                            price: price_at(symbol, ts),
                            allocation: Some(*a),
                            amount: None,
                            sub_type: None,
                        }
                    })
                    .collect(),
                entry_price: None,
                entry_time: None,
                exit_time: exit_ms,
                exit_price: exit_ms.map(|x| price_at(symbol, x)),
                profit,
                profit_percent,
            }
        })
        .collect()
}

/// The same trades as raw entry/exit signals, newest first.
#[must_use]
pub fn signals(symbol: &str, end_ms: i64) -> Vec<SignalRecord> {
    let mut out = Vec::new();
    for t in &TRADES {
        for (h, a) in t.entries {
            let ts = end_ms - h * HOUR_MS;
            out.push(SignalRecord {
                kind: SignalKind::Entry,
                position_id: t.id.to_string(),
                timestamp: ts,
                price: price_at(symbol, ts),
                allocation: Some(*a),
                amount: None,
                sub_type: None,
                profit: None,
                profit_percent: None,
            });
        }
        if let Some(h) = t.exit_hours_before_end {
            let ts = end_ms - h * HOUR_MS;
            let (p, pct) = profit(symbol, end_ms, t, ts);
            out.push(SignalRecord {
                kind: SignalKind::Exit,
                position_id: t.id.to_string(),
                timestamp: ts,
                price: price_at(symbol, ts),
                allocation: None,
                amount: None,
                sub_type: None,
                profit: Some(p),
                profit_percent: Some(pct),
            });
        }
    }
    out.sort_by_key(|s| std::cmp::Reverse(s.timestamp));
    out
}

/// Channel samples every 15 minutes over the `days` days before `end_ms`.
#[must_use]
pub fn channel(symbol: &str, end_ms: i64, days: u32) -> Vec<ChannelPoint> {
    const STEP_MS: i64 = 15 * 60_000;
    let start = end_ms - i64::from(days) * DAY_MS;
    let first = start - start.rem_euclid(STEP_MS);
    (0..)
        .map(|i| first + i * STEP_MS)
        .take_while(|t| *t < end_ms)
        .map(|t| {
            let mid = mid_price(symbol, t);
            ChannelPoint {
                time: t.div_euclid(1000),
                upper_band: mid * 1.01,
                lower_band: mid * 0.99,
                middle: Some(mid),
                oscillator: None,
            }
        })
        .collect()
}
