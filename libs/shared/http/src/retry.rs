use std::time::Duration;

use rand::Rng;

use shared_config::AppConfig;

/// Capped exponential backoff with additive random jitter.
///
/// The wait before retry `n` (zero based) is `min(base * 2^n, max_delay)`
/// plus a uniformly drawn jitter in `[0, max_jitter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8_000),
            max_jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.http_max_retries,
            base_delay: Duration::from_millis(config.http_retry_base_ms),
            max_delay: Duration::from_millis(config.http_retry_max_ms),
            max_jitter: Duration::from_millis(config.http_retry_jitter_ms),
        }
    }

    /// A policy that gives up after the first failure.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Deterministic part of the wait before retry `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.backoff(attempt) + jitter
    }

    /// Lower bound of the total time spent waiting across `retries` retries.
    pub fn min_total_delay(&self, retries: u32) -> Duration {
        (0..retries).map(|attempt| self.backoff(attempt)).sum()
    }

    /// Upper bound of the total time spent waiting across `retries` retries.
    pub fn max_total_delay(&self, retries: u32) -> Duration {
        (0..retries)
            .map(|attempt| self.backoff(attempt) + self.max_jitter)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
            max_jitter: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = policy();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
        assert_eq!(policy.backoff(4), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(40), Duration::from_millis(1_000));
    }

    #[test]
    fn test_delay_stays_within_jitter_window() {
        let policy = policy();
        for attempt in 0..6 {
            for _ in 0..50 {
                let delay = policy.delay_for(attempt);
                assert!(delay >= policy.backoff(attempt));
                assert!(delay <= policy.backoff(attempt) + policy.max_jitter);
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            max_jitter: Duration::ZERO,
            ..policy()
        };
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_total_delay_bounds() {
        let policy = policy();
        assert_eq!(policy.min_total_delay(2), Duration::from_millis(300));
        assert_eq!(policy.max_total_delay(2), Duration::from_millis(400));
        assert_eq!(policy.min_total_delay(0), Duration::ZERO);
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            http_max_retries: 7,
            http_retry_base_ms: 10,
            http_retry_max_ms: 20,
            http_retry_jitter_ms: 0,
            ..AppConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 7);
        assert_eq!(policy.backoff(5), Duration::from_millis(20));
        assert_eq!(policy.max_jitter, Duration::ZERO);
    }
}
