//! Conversion of upstream position records into normalized `Position`s.
//!
//! Normalization is a pure function of the payload: no state survives
//! between calls, so normalizing the same payload twice yields identical
//! output.

use std::collections::BTreeMap;

use crate::model::{Entry, Exit, Position};
use crate::upstream::{AggregatedPosition, EntryRecord, SignalKind, SignalRecord};

mod shape;

pub use shape::PositionPayload;

/// Interpret an upstream allocation as a positive weight.
///
/// Values above 1 are percentages; missing, non-finite or non-positive
/// values count as a full allocation.
#[must_use]
pub fn normalize_allocation(raw: Option<f64>) -> f64 {
    match raw {
        Some(a) if a.is_finite() && a > 1.0 => a / 100.0,
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => 1.0,
    }
}

/// Normalize a payload of either shape.
///
/// Output is ordered by first entry time, then id. Records without usable
/// entries are dropped. An exit that precedes the last entry is discarded
/// and the position stays open, so its entries still produce markers.
#[must_use]
pub fn normalize_positions(payload: &PositionPayload) -> Vec<Position> {
    let mut out = match payload {
        PositionPayload::Aggregated(records) => {
            records.iter().filter_map(from_aggregated).collect()
        }
        PositionPayload::Signals(records) => from_signals(records),
    };
    out.sort_by(|a: &Position, b: &Position| {
        a.opened_at()
            .cmp(&b.opened_at())
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

fn entry_from_record(r: &EntryRecord) -> Entry {
    Entry {
        timestamp: r.timestamp,
        price: r.price,
        allocation: normalize_allocation(r.allocation),
        amount: r.amount,
        sub_type: r.sub_type.clone(),
    }
}

fn from_aggregated(rec: &AggregatedPosition) -> Option<Position> {
    let mut entries: Vec<Entry> = rec.entries.iter().map(entry_from_record).collect();
    if entries.is_empty()
        && let (Some(ts), Some(price)) = (rec.entry_time, rec.entry_price)
    {
        entries.push(Entry {
            timestamp: ts,
            price,
            allocation: 1.0,
            amount: None,
            sub_type: None,
        });
    }
    let exit = match (rec.exit_time, rec.exit_price) {
        (Some(timestamp), Some(price)) => Some(Exit {
            timestamp,
            price,
            profit: rec.profit,
            profit_percent: rec.profit_percent,
        }),
        _ => None,
    };
    let exit = settle_exit(&rec.id, &entries, exit);
    accept(Position::new(rec.id.clone(), entries, exit, rec.entry_price))
}

#[derive(Default)]
struct SignalGroup {
    entries: Vec<Entry>,
    exit: Option<Exit>,
}

fn from_signals(records: &[SignalRecord]) -> Vec<Position> {
    let mut groups: BTreeMap<&str, SignalGroup> = BTreeMap::new();
    for s in records {
        let group = groups.entry(s.position_id.as_str()).or_default();
        match s.kind {
            SignalKind::Entry => group.entries.push(Entry {
                timestamp: s.timestamp,
                price: s.price,
                allocation: normalize_allocation(s.allocation),
                amount: s.amount,
                sub_type: s.sub_type.clone(),
            }),
            SignalKind::Exit => {
                if group.exit.as_ref().is_none_or(|x| s.timestamp > x.timestamp) {
                    group.exit = Some(Exit {
                        timestamp: s.timestamp,
                        price: s.price,
                        profit: s.profit,
                        profit_percent: s.profit_percent,
                    });
                }
            }
        }
    }
    groups
        .into_iter()
        .filter(|(_, g)| !g.entries.is_empty())
        .filter_map(|(id, g)| {
            let exit = settle_exit(id, &g.entries, g.exit);
            accept(Position::new(id, g.entries, exit, None))
        })
        .collect()
}

/// Keep `exit` only when it is at or after the last entry.
fn settle_exit(_id: &str, entries: &[Entry], exit: Option<Exit>) -> Option<Exit> {
    let last_entry = entries.iter().map(|e| e.timestamp).max()?;
    match exit {
        Some(x) if x.timestamp < last_entry => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                position = _id,
                exit_ms = x.timestamp,
                last_entry_ms = last_entry,
                "exit precedes the last entry; keeping the position open"
            );
            None
        }
        other => other,
    }
}

fn accept(built: Result<Position, candela_types::CandelaError>) -> Option<Position> {
    match built {
        Ok(p) => Some(p),
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_e, "dropping invalid position");
            None
        }
    }
}
