//! Timeout and retry policy for opening a connection.
//!
//! The sync store gives no guarantee that an open request ever resolves, so
//! every attempt is bounded by a timeout and retried a fixed number of times.
//! Retries are only issued while the attempt's generation is still current;
//! that check lives in posts-client.

use std::time::Duration;

/// Maximum random jitter added to a retry delay.
const MAX_JITTER_MS: u64 = 250;

/// Cap on the exponential retry delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Open timeout/retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPolicy {
    /// Bound on a single open attempt.
    pub timeout: Duration,
    /// Extra attempts after the first one fails or times out.
    pub retries: u32,
    /// Base delay before the first retry; doubles per further retry.
    pub retry_delay: Duration,
    /// Add random jitter to retry delays.
    pub jitter: bool,
}

impl OpenPolicy {
    /// Fixed 15s timeout and one retry after 500ms.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            retries: 1,
            retry_delay: Duration::from_millis(500),
            jitter: true,
        }
    }

    /// A policy that never retries and never waits (for tests).
    pub fn immediate(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: 0,
            retry_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the base retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Disable jitter (deterministic delays).
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Total number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// Formula: min(10s, retry_delay * 2^(retry-1)) + random(0..=250ms)
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1).min(16));
        let base = self
            .retry_delay
            .checked_mul(factor)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY);

        if self.jitter && !base.is_zero() {
            base + Duration::from_millis(random_jitter_ms())
        } else {
            base
        }
    }
}

impl Default for OpenPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Random jitter between 0 and MAX_JITTER_MS milliseconds.
///
/// Falls back to no jitter if the OS RNG is unavailable.
fn random_jitter_ms() -> u64 {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        return 0;
    }
    u64::from_le_bytes(bytes) % (MAX_JITTER_MS + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_retry() {
        let policy = OpenPolicy::default();
        assert_eq!(policy.retries, 1);
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.timeout, Duration::from_secs(15));
    }

    #[test]
    fn immediate_has_single_attempt() {
        let policy = OpenPolicy::immediate(Duration::from_millis(50));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_before(1), Duration::ZERO);
    }

    #[test]
    fn delay_doubles_without_jitter() {
        let policy = OpenPolicy::new()
            .with_retry_delay(Duration::from_millis(100))
            .without_jitter();
        assert_eq!(policy.delay_before(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before(3), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        let policy = OpenPolicy::new()
            .with_retry_delay(Duration::from_secs(3))
            .without_jitter();
        assert_eq!(policy.delay_before(10), MAX_RETRY_DELAY);
        assert_eq!(policy.delay_before(u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn jitter_stays_bounded() {
        let policy = OpenPolicy::new().with_retry_delay(Duration::from_millis(100));
        for _ in 0..20 {
            let delay = policy.delay_before(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(100 + MAX_JITTER_MS));
        }
    }

    #[test]
    fn builder_pattern() {
        let policy = OpenPolicy::new()
            .with_timeout(Duration::from_secs(2))
            .with_retries(3);
        assert_eq!(policy.timeout, Duration::from_secs(2));
        assert_eq!(policy.max_attempts(), 4);
    }
}
