//! Retry policy for idempotent storefront reads.

use std::time::Duration;

use crate::error::Error;

/// Backoff for `GET /products` and `GET /cart`.
///
/// Only errors whose kind is retriable (`Unavailable`, `Timeout`,
/// `RateLimited`, `Connection`) are retried. A server-supplied `Retry-After`
/// replaces the computed delay. Cart deltas and orders never go through
/// this policy: replaying a `+1` doubles it, and retrying an order is the
/// shopper's call.
///
/// ```rust
/// use std::time::Duration;
/// use storefront::{Error, RetryConfig};
///
/// let config = RetryConfig::new()
///     .with_max_retries(2)
///     .with_initial_delay(Duration::from_millis(200))
///     .with_jitter(0.0);
///
/// let busy = Error::unavailable("catalog warming up");
/// assert_eq!(config.next_delay(1, &busy), Some(Duration::from_millis(200)));
/// assert_eq!(config.next_delay(3, &busy), None);
/// assert_eq!(config.next_delay(1, &Error::not_found("no such page")), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap for computed delays.
    pub max_delay: Duration,
    /// Growth factor between consecutive retries.
    pub multiplier: f64,
    /// Spread applied around each delay, in `[0.0, 1.0]`.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryConfig {
    /// The default policy: three retries starting at 100ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that gives up after the first failure.
    pub fn disabled() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub fn with_max_retries(self, max_retries: u32) -> Self {
        Self {
            max_retries,
            ..self
        }
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(self, initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..self
        }
    }

    /// Sets the cap for computed delays.
    #[must_use]
    pub fn with_max_delay(self, max_delay: Duration) -> Self {
        Self { max_delay, ..self }
    }

    /// Sets the growth factor.
    #[must_use]
    pub fn with_multiplier(self, multiplier: f64) -> Self {
        Self { multiplier, ..self }
    }

    /// Sets the jitter, clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn with_jitter(self, jitter: f64) -> Self {
        Self {
            jitter: jitter.clamp(0.0, 1.0),
            ..self
        }
    }

    /// How long to wait before retry number `retry` (1-based) after `error`,
    /// or `None` to give up.
    pub fn next_delay(&self, retry: u32, error: &Error) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries || !error.kind().is_retriable() {
            return None;
        }
        Some(
            error
                .retry_after()
                .unwrap_or_else(|| self.delay_for_attempt(retry)),
        )
    }

    /// Capped exponential backoff with jitter for retry number `retry` (1-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let Some(steps) = retry.checked_sub(1) else {
            return Duration::ZERO;
        };
        let exponent = i32::try_from(steps).unwrap_or(i32::MAX);
        let secs = (self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent))
            .min(self.max_delay.as_secs_f64());

        if self.jitter == 0.0 {
            return Duration::from_secs_f64(secs);
        }
        let spread = secs * self.jitter * (fastrand::f64() * 2.0 - 1.0);
        Duration::from_secs_f64((secs + spread).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn steady() -> RetryConfig {
        RetryConfig::new().with_jitter(0.0)
    }

    #[test_case(0, 0 ; "no retry yet")]
    #[test_case(1, 100 ; "first")]
    #[test_case(2, 200 ; "second")]
    #[test_case(3, 400 ; "third")]
    fn test_backoff_doubles(retry: u32, millis: u64) {
        assert_eq!(
            steady().delay_for_attempt(retry),
            Duration::from_millis(millis)
        );
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = steady()
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_multiplier(10.0);
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let config = RetryConfig::new().with_jitter(0.5);
        for _ in 0..50 {
            let delay = config.delay_for_attempt(1);
            assert!((Duration::from_millis(50)..=Duration::from_millis(150)).contains(&delay));
        }
        assert_eq!(RetryConfig::new().with_jitter(2.0).jitter, 1.0);
        assert_eq!(RetryConfig::new().with_jitter(-0.5).jitter, 0.0);
    }

    #[test]
    fn test_only_retriable_kinds_retry() {
        let config = steady();
        assert!(config.next_delay(1, &Error::timeout("slow")).is_some());
        assert!(config.next_delay(1, &Error::connection("reset")).is_some());
        assert!(config.next_delay(1, &Error::internal("boom")).is_none());
        assert!(config.next_delay(1, &Error::not_found("gone")).is_none());
    }

    #[test]
    fn test_retry_after_wins_over_backoff() {
        let limited = Error::new(crate::error::ErrorKind::RateLimited, "slow down")
            .with_retry_after(Duration::from_secs(2));
        assert_eq!(steady().next_delay(1, &limited), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let down = Error::unavailable("down");
        assert!(steady().next_delay(3, &down).is_some());
        assert!(steady().next_delay(4, &down).is_none());
        assert!(RetryConfig::disabled().next_delay(1, &down).is_none());
    }
}
