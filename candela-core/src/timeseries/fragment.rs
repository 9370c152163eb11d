use serde::{Deserialize, Serialize};

use candela_types::{CandelaError, Resolution};

/// A half-open request window `[start_ms, end_ms)` for one upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Inclusive start (ms since epoch).
    pub start_ms: i64,
    /// Exclusive end (ms since epoch).
    pub end_ms: i64,
    /// Bar resolution the window is sized for.
    pub resolution: Resolution,
}

impl Fragment {
    /// Window length in milliseconds.
    #[must_use]
    pub const fn span_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Upper bound on the bar open times that fall inside the window.
    #[must_use]
    pub const fn expected_bars(&self) -> i64 {
        let bar = self.resolution.as_millis();
        (self.span_ms() + bar - 1) / bar
    }
}

/// Split `[start_ms, end_ms)` into consecutive windows of at most
/// `max_bars` bars each.
///
/// Windows are contiguous and non-overlapping; their union is exactly the
/// input range. Only the last window may be shorter than the cap.
///
/// # Errors
/// Returns `InvalidArg` when the range is empty or `max_bars` is zero.
pub fn plan_fragments(
    start_ms: i64,
    end_ms: i64,
    resolution: Resolution,
    max_bars: u32,
) -> Result<Vec<Fragment>, CandelaError> {
    if start_ms >= end_ms {
        return Err(CandelaError::InvalidArg(format!(
            "empty range: start {start_ms} >= end {end_ms}"
        )));
    }
    if max_bars == 0 {
        return Err(CandelaError::InvalidArg(
            "max bars per request must be > 0".into(),
        ));
    }
    let window = resolution.as_millis().saturating_mul(i64::from(max_bars));
    let mut out = Vec::new();
    let mut cursor = start_ms;
    while cursor < end_ms {
        let next = cursor.saturating_add(window).min(end_ms);
        out.push(Fragment {
            start_ms: cursor,
            end_ms: next,
            resolution,
        });
        cursor = next;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn two_days_of_minutes_need_three_requests() {
        let frags = plan_fragments(0, 2 * DAY_MS, Resolution::M1, 1000).unwrap();
        assert_eq!(frags.len(), 3);
        let bars: Vec<i64> = frags.iter().map(Fragment::expected_bars).collect();
        assert_eq!(bars, vec![1000, 1000, 880]);
        assert_eq!(frags[0].start_ms, 0);
        assert_eq!(frags[2].end_ms, 2 * DAY_MS);
        for pair in frags.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
    }

    #[test]
    fn short_range_is_one_fragment() {
        let frags = plan_fragments(1_000, 2_000, Resolution::H1, 1000).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].expected_bars(), 1);
    }

    #[test]
    fn empty_or_degenerate_inputs_rejected() {
        assert!(matches!(
            plan_fragments(5, 5, Resolution::M1, 1000),
            Err(CandelaError::InvalidArg(_))
        ));
        assert!(matches!(
            plan_fragments(0, 60_000, Resolution::M1, 0),
            Err(CandelaError::InvalidArg(_))
        ));
    }
}
