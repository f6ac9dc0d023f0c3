//! Retry policy with jittered exponential backoff.

use std::time::Duration;

use rand::Rng;

/// Bounded retry budget for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Returns the backoff delay after a failed `attempt` (1-based).
    ///
    /// Doubles per attempt up to `max_delay`, with half the window
    /// randomized to keep concurrent redeliveries from thundering in step.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let ceiling = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_delay);

        let half = ceiling / 2;
        let jitter_ms = rand::rng().random_range(0..=half.as_millis().max(1));
        #[allow(clippy::cast_possible_truncation)]
        let jitter = Duration::from_millis(jitter_ms as u64);
        half + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_with_attempts_and_stays_bounded() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        };

        for attempt in 1..=10 {
            let delay = policy.delay_for(attempt);
            assert!(delay <= policy.max_delay, "attempt {attempt} exceeded cap");
        }

        // The deterministic half of the window doubles per attempt.
        assert!(policy.delay_for(3) >= Duration::from_millis(200));
    }

    #[test]
    fn test_first_retry_waits_at_least_half_the_base_delay() {
        let policy = RetryPolicy::default();

        assert!(policy.delay_for(1) >= Duration::from_millis(50));
    }
}
