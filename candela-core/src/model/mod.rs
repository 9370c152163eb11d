mod candle;
mod marker;
mod position;

pub use candle::{Candle, ChannelPoint, IndicatorPoint, LinePoint, PriceBar};
pub use marker::{Marker, MarkerPosition, MarkerShape};
pub use position::{Entry, Exit, Position, PositionStatus};

/// A record carrying an instant that can be snapped onto a reference axis.
pub trait Timestamped {
    /// Instant of the record in milliseconds since the epoch.
    fn timestamp_ms(&self) -> i64;
}
