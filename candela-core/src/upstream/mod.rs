use serde::{Deserialize, Serialize};

pub mod de;

/// One entry of an aggregated position as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    /// Fill time.
    #[serde(alias = "time", alias = "entryTime", deserialize_with = "de::ts")]
    pub timestamp: i64,
    /// Fill price.
    #[serde(alias = "entryPrice", deserialize_with = "de::num")]
    pub price: f64,
    /// Allocation as a fraction or a percentage.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub allocation: Option<f64>,
    /// Quantity.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub amount: Option<f64>,
    /// Upstream sub-type label.
    #[serde(default)]
    pub sub_type: Option<String>,
}

/// A pre-aggregated position from the position history endpoint.
///
/// Single-entry positions sometimes omit `entries` and carry the fill in
/// `entryTime`/`entryPrice` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPosition {
    /// Position identifier (string or number upstream).
    #[serde(alias = "positionId", alias = "_id", deserialize_with = "de::id")]
    pub id: String,
    /// Upstream status label; informational only.
    #[serde(default)]
    pub status: Option<String>,
    /// Entries in any order.
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
    /// Average entry price as computed upstream.
    #[serde(default, alias = "avgEntryPrice", deserialize_with = "de::opt_num")]
    pub entry_price: Option<f64>,
    /// Fill time of a single-entry position without `entries`.
    #[serde(default, deserialize_with = "de::opt_ts")]
    pub entry_time: Option<i64>,
    /// Exit fill time.
    #[serde(default, deserialize_with = "de::opt_ts")]
    pub exit_time: Option<i64>,
    /// Exit fill price.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub exit_price: Option<f64>,
    /// Absolute profit.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub profit: Option<f64>,
    /// Profit in percent.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub profit_percent: Option<f64>,
}

/// Direction of a raw trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Opens or scales into a position.
    #[serde(alias = "ENTRY", alias = "Entry", alias = "buy", alias = "BUY")]
    Entry,
    /// Closes a position.
    #[serde(alias = "EXIT", alias = "Exit", alias = "sell", alias = "SELL")]
    Exit,
}

/// One raw entry or exit signal; grouped by `position_id` during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    /// Signal direction.
    #[serde(rename = "type")]
    pub kind: SignalKind,
    /// Position this signal belongs to.
    #[serde(deserialize_with = "de::id")]
    pub position_id: String,
    /// Signal time.
    #[serde(alias = "time", deserialize_with = "de::ts")]
    pub timestamp: i64,
    /// Fill price.
    #[serde(deserialize_with = "de::num")]
    pub price: f64,
    /// Allocation of an entry, as a fraction or a percentage.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub allocation: Option<f64>,
    /// Quantity.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub amount: Option<f64>,
    /// Upstream sub-type label.
    #[serde(default)]
    pub sub_type: Option<String>,
    /// Absolute profit of an exit.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub profit: Option<f64>,
    /// Profit in percent of an exit.
    #[serde(default, deserialize_with = "de::opt_num")]
    pub profit_percent: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_accepts_numeric_ids_and_iso_times() {
        let p: AggregatedPosition = serde_json::from_str(
            r#"{"positionId": 42, "entries": [{"time": "2024-01-01T00:00:00Z", "price": "100.5"}],
                "exitTime": 1704067260000, "exitPrice": 101, "profit": null}"#,
        )
        .unwrap();
        assert_eq!(p.id, "42");
        assert_eq!(p.entries[0].timestamp, 1_704_067_200_000);
        assert!((p.entries[0].price - 100.5).abs() < f64::EPSILON);
        assert_eq!(p.exit_time, Some(1_704_067_260_000));
        assert_eq!(p.profit, None);
    }

    #[test]
    fn signal_kind_is_case_insensitive_enough() {
        let s: SignalRecord = serde_json::from_str(
            r#"{"type":"EXIT","positionId":"a","timestamp":5,"price":1.0,"profitPercent":-2}"#,
        )
        .unwrap();
        assert_eq!(s.kind, SignalKind::Exit);
        assert_eq!(s.profit_percent, Some(-2.0));
    }
}
