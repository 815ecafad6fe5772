use crate::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_RETRY_MIN_DELAY_MS,
    DEFAULT_RETRY_STATUSES,
};
use rand::Rng;
use std::time::Duration;

/// Per-request retry behavior shared by every call made through a [`RetryClient`].
///
/// A request is repeated only when the server answers with one of
/// `retry_statuses`; transport errors and every other status fail immediately.
/// Between attempts the client sleeps for a uniformly random delay within
/// `[min_delay, max_delay]`.
///
/// [`RetryClient`]: super::RetryClient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retry_statuses: Vec<u16>,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            min_delay: Duration::from_millis(DEFAULT_RETRY_MIN_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1 and
    /// `max_delay` to at least `min_delay`.
    pub fn new(
        max_attempts: u32,
        retry_statuses: Vec<u16>,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_statuses,
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay_bounds(&self) -> (Duration, Duration) {
        (self.min_delay, self.max_delay)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Whether a request that just got `status` on attempt `attempt` (1-indexed)
    /// should be sent again.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        attempt < self.max_attempts && self.is_retryable_status(status)
    }

    /// Picks a random delay within the configured bounds.
    pub fn backoff_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..=self.max_delay)
    }
}
