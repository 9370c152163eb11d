use crate::model::Candle;
use candela_types::Resolution;

const DAY_MS: i64 = 86_400_000;

/// Monday-start week of an epoch day (day 0 is a Thursday).
const fn week_start_day(day: i64) -> i64 {
    day - ((day + 3).rem_euclid(7))
}

/// Open time (ms) of the `target` bucket containing `ms`.
///
/// Sub-weekly buckets align to multiples of the bar length from the epoch;
/// weekly buckets start on Monday 00:00 UTC.
#[must_use]
pub const fn bucket_start_ms(ms: i64, target: Resolution) -> i64 {
    if matches!(target, Resolution::W1) {
        return week_start_day(ms.div_euclid(DAY_MS)) * DAY_MS;
    }
    let step = target.as_millis();
    ms - ms.rem_euclid(step)
}

struct Agg {
    bucket: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Agg {
    const fn start(bucket: i64, c: &Candle) -> Self {
        Self {
            bucket,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        }
    }

    fn push(&mut self, c: &Candle) {
        self.high = self.high.max(c.high);
        self.low = self.low.min(c.low);
        self.close = c.close;
        self.volume += c.volume;
    }

    const fn finish(self) -> Candle {
        Candle::new(
            self.bucket,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

/// Aggregate candles into `target` buckets.
///
/// Open is the first open, close the last close, high/low the extremes and
/// volume the sum within each bucket. Input order does not matter; the output
/// is sorted and stamped with the bucket open time. Buckets with no input
/// produce no output.
#[must_use]
pub fn resample_candles(candles: &[Candle], target: Resolution) -> Vec<Candle> {
    let mut sorted: Vec<&Candle> = candles.iter().collect();
    sorted.sort_by_key(|c| c.original_time);

    let mut out = Vec::new();
    let mut cur: Option<Agg> = None;
    for c in sorted {
        let b = bucket_start_ms(c.original_time, target);
        match cur.as_mut() {
            Some(agg) if agg.bucket == b => agg.push(c),
            _ => {
                if let Some(done) = cur.take() {
                    out.push(done.finish());
                }
                cur = Some(Agg::start(b, c));
            }
        }
    }
    if let Some(done) = cur {
        out.push(done.finish());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(min: i64, o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle::new(min * 60_000, o, h, l, c, 1.0)
    }

    #[test]
    fn minutes_to_hour() {
        let candles = vec![
            mk(0, 10.0, 12.0, 9.0, 11.0),
            mk(30, 11.0, 15.0, 10.0, 14.0),
            mk(59, 14.0, 14.5, 8.0, 9.0),
            mk(60, 9.0, 9.5, 8.5, 9.2),
        ];
        let out = resample_candles(&candles, Resolution::H1);
        assert_eq!(out.len(), 2);
        let h = out[0];
        assert_eq!(h.original_time, 0);
        assert!((h.open - 10.0).abs() < f64::EPSILON);
        assert!((h.high - 15.0).abs() < f64::EPSILON);
        assert!((h.low - 8.0).abs() < f64::EPSILON);
        assert!((h.close - 9.0).abs() < f64::EPSILON);
        assert!((h.volume - 3.0).abs() < f64::EPSILON);
        assert_eq!(out[1].time, 3_600);
    }

    #[test]
    fn weeks_start_on_monday() {
        // 1970-01-05 was a Monday.
        assert_eq!(bucket_start_ms(4 * DAY_MS + 5, Resolution::W1), 4 * DAY_MS);
        assert_eq!(bucket_start_ms(3 * DAY_MS, Resolution::W1), -3 * DAY_MS);
        assert_eq!(bucket_start_ms(11 * DAY_MS - 1, Resolution::W1), 4 * DAY_MS);
    }
}
