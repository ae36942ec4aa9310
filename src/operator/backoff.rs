//! Retry backoff policies for the boot supervisor

use std::time::Duration;

/// Pluggable retry strategy controlling the delay between boot attempts
///
/// `attempt` is the 0-based index of the attempt that just failed. A return
/// of `None` means the budget is exhausted and the caller must stop
/// retrying.
pub trait BackoffPolicy: Send + Sync {
    fn delay_for(&self, attempt: u32) -> Option<Duration>;
}

/// Exponential backoff with a bounded attempt count
///
/// The delay grows as `base_delay * 2^attempt`, capped at `max_delay`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Total attempts allowed, including the first one
    pub max_attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    /// Policy with a bounded attempt count and the default delay curve
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(15),
            max_delay: Duration::from_secs(300),
            max_attempts: 8,
        }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }

        let base = self.base_delay.as_millis() as u64;
        let delay_ms = base.saturating_mul(2_u64.saturating_pow(attempt.min(5)));
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);

        Some(Duration::from_millis(capped))
    }
}
