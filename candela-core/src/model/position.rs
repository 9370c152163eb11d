use serde::{Deserialize, Serialize};

use candela_types::CandelaError;

/// One fill that opened or scaled into a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Fill time (ms since epoch).
    pub timestamp: i64,
    /// Fill price.
    pub price: f64,
    /// Relative weight of this entry; always positive after normalization.
    pub allocation: f64,
    /// Quantity, when the upstream reports it.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Upstream sub-type label (e.g. `"DCA"`), passed through untouched.
    #[serde(default)]
    pub sub_type: Option<String>,
}

/// The fill that closed a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    /// Fill time (ms since epoch).
    pub timestamp: i64,
    /// Fill price.
    pub price: f64,
    /// Absolute profit, when reported.
    #[serde(default)]
    pub profit: Option<f64>,
    /// Profit in percent, when reported.
    #[serde(default)]
    pub profit_percent: Option<f64>,
}

impl Exit {
    /// Profit sign used for marker coloring; absolute profit wins over percent.
    #[must_use]
    pub fn is_profitable(&self) -> Option<bool> {
        self.profit
            .or(self.profit_percent)
            .filter(|p| p.is_finite())
            .map(|p| p >= 0.0)
    }
}

/// Lifecycle state of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    /// No exit yet.
    Open,
    /// Exit recorded.
    Closed,
}

/// A normalized trading position.
///
/// Invariants: at least one entry, entries sorted by timestamp, exit (when
/// present) not earlier than the last entry, status consistent with the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Upstream position identifier.
    pub id: String,
    /// Entries in timestamp order.
    pub entries: Vec<Entry>,
    /// Exit fill, if closed.
    pub exit: Option<Exit>,
    /// Derived lifecycle state.
    pub status: PositionStatus,
    /// Average entry price.
    pub entry_price: f64,
}

impl Position {
    /// Assemble a position, enforcing its invariants.
    ///
    /// `entry_price` overrides the allocation-weighted average when it is a
    /// positive finite number.
    ///
    /// # Errors
    /// Returns `Data` when there are no entries, an entry price is not
    /// finite, or the exit precedes the last entry.
    pub fn new(
        id: impl Into<String>,
        mut entries: Vec<Entry>,
        exit: Option<Exit>,
        entry_price: Option<f64>,
    ) -> Result<Self, CandelaError> {
        let id = id.into();
        if entries.is_empty() {
            return Err(CandelaError::Data(format!("position {id} has no entries")));
        }
        if entries.iter().any(|e| !e.price.is_finite()) {
            return Err(CandelaError::Data(format!(
                "position {id} has a non-finite entry price"
            )));
        }
        entries.sort_by_key(|e| e.timestamp);
        let last_entry = entries.last().map_or(i64::MIN, |e| e.timestamp);
        if let Some(x) = &exit
            && x.timestamp < last_entry
        {
            return Err(CandelaError::Data(format!(
                "position {id} exits at {} before its last entry at {last_entry}",
                x.timestamp
            )));
        }
        let entry_price = entry_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| weighted_entry_price(&entries))
            .unwrap_or(entries[0].price);
        let status = if exit.is_some() {
            PositionStatus::Closed
        } else {
            PositionStatus::Open
        };
        Ok(Self {
            id,
            entries,
            exit,
            status,
            entry_price,
        })
    }

    /// Timestamp of the first entry.
    #[must_use]
    pub fn opened_at(&self) -> i64 {
        self.entries.first().map_or(i64::MIN, |e| e.timestamp)
    }
}

/// Allocation-weighted average of the entry prices.
///
/// Returns `None` when the weights do not sum to a positive finite number.
#[must_use]
fn weighted_entry_price(entries: &[Entry]) -> Option<f64> {
    let total: f64 = entries.iter().map(|e| e.allocation).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let sum: f64 = entries.iter().map(|e| e.price * e.allocation).sum();
    Some(sum / total).filter(|p| p.is_finite())
}
