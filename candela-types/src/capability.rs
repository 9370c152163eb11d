use core::fmt;
use serde::{Deserialize, Serialize};

/// Upstream capability labels used in errors, timeouts and telemetry.
///
/// Each maps one-to-one to an upstream endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Capability {
    /// Paginated OHLCV candles.
    Candles,
    /// Pre-aggregated position history of an instance.
    PositionHistory,
    /// Raw entry/exit signals of an instance.
    Signals,
    /// Pre-computed channel (band) history of an instance.
    ChannelHistory,
}

impl Capability {
    /// Stable, kebab-case identifier for logs/errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Candles => "candles",
            Self::PositionHistory => "position-history",
            Self::Signals => "signals",
            Self::ChannelHistory => "channel-history",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
