/* src/ratelimit.rs */

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// A process-wide throttle that spaces every outbound upstream call at least
/// `1 / R` seconds apart, no matter which operation or upstream triggered it.
///
/// The wait is performed while the lock is held, so a second caller cannot
/// compute its own wait against a `last_call` that is about to change.
pub struct RateGate {
    /// `None` when the configured rate is non-positive: the gate is open.
    min_interval: Option<Duration>,
    last_call: Mutex<Option<Instant>>,
}

impl RateGate {
    #[must_use]
    pub fn new(calls_per_second: f64) -> Self {
        // NaN compares false and lands here as well.
        let min_interval = if calls_per_second > 0.0 {
            Some(Duration::try_from_secs_f64(1.0 / calls_per_second).unwrap_or(Duration::MAX))
        } else {
            None
        };

        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self::new(0.0)
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.min_interval.is_some()
    }

    #[cfg(test)]
    fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Waits until the caller may perform one outbound call.
    pub async fn acquire(&self) {
        let Some(min_interval) = self.min_interval else {
            return;
        };

        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = Instant::now().saturating_duration_since(previous);
            if elapsed < min_interval {
                sleep(min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
