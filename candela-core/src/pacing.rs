use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use candela_types::PacingConfig;

/// Fixed-delay scheduler for sequential upstream requests.
///
/// A request starts at least `min_interval` after the previous one finished
/// (as reported by [`Pacer::done`]). Without a `done` call the previous start
/// counts as its finish. Time comes from `tokio::time`, so tests can drive it
/// with a paused clock.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_finish: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Create a pacer from configuration.
    #[must_use]
    pub fn new(cfg: PacingConfig) -> Self {
        Self {
            min_interval: cfg.min_interval,
            last_finish: Mutex::new(None),
        }
    }

    /// Configured pause between the end of one request and the start of the next.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may start.
    ///
    /// The first call returns immediately. Returns how long the caller waited.
    pub async fn ready(&self) -> Duration {
        let mut last = self.last_finish.lock().await;
        let now = Instant::now();
        let waited = match *last {
            Some(prev) => {
                let due = prev + self.min_interval;
                if due > now {
                    tokio::time::sleep_until(due).await;
                    due - now
                } else {
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        };
        *last = Some(Instant::now());
        waited
    }

    /// Mark the current request as finished; the next [`ready`](Self::ready)
    /// waits a full `min_interval` from now.
    pub async fn done(&self) {
        *self.last_finish.lock().await = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}
