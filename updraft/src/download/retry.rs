//! Reconnect backoff policy.
//!
//! Transport reconnects back off exponentially with full jitter so a fleet
//! of devices recovering from the same outage does not stampede the file
//! server.

use std::time::Duration;

use rand::Rng;

/// Default base delay between reconnect attempts (500ms).
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Default cap on a single backoff delay (2 seconds).
pub const DEFAULT_MAX_DELAY_MS: u64 = 2000;

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Exponential backoff with full jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Base delay for the first attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Attempts allowed before the operation is abandoned.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit limits.
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    /// Delay before the given attempt (1-based), or `None` when the
    /// attempt budget is exhausted.
    ///
    /// The delay is drawn uniformly from `0..=min(max_delay, base * 2^(n-1))`.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let exp = attempt.saturating_sub(1).min(31);
        let cap = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);

        let jittered = rand::rng().random_range(0..=cap.as_millis() as u64);
        Some(Duration::from_millis(jittered))
    }
}
