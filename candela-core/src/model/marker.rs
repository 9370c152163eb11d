use serde::{Deserialize, Serialize};

/// Vertical placement of a marker relative to its bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPosition {
    /// Above the high.
    AboveBar,
    /// Below the low.
    BelowBar,
}

/// Glyph drawn for a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    /// Upward arrow (entries).
    ArrowUp,
    /// Downward arrow (exits).
    ArrowDown,
}

/// A chart annotation anchored to one reference-axis bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Bar time in seconds; always present on the reference axis.
    pub time: i64,
    /// Placement relative to the bar.
    pub position: MarkerPosition,
    /// Glyph.
    pub shape: MarkerShape,
    /// CSS color.
    pub color: String,
    /// Label, e.g. `"FIRST 101.50"`.
    pub text: String,
    /// Stable identifier, e.g. `"42-entry-0"`.
    pub id: String,
}
