//! Reconnection strategies
//!
//! When the socket drops, the strategy decides how long to wait before the
//! next connection attempt. The client never gives up: a lightning daemon
//! that restarts should be picked up again whenever it comes back.
//!
//! # Built-in Strategies
//!
//! - **ExponentialBackoff**: doubling delays up to a ceiling (default 1s → 16s)
//! - **FixedDelay**: constant delay between attempts
//!
//! # Examples
//!
//! ```rust
//! use lnrpc_client::{ExponentialBackoff, ReconnectionStrategy};
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::default();
//! let delays: Vec<_> = (0..6).map(|attempt| backoff.next_delay(attempt)).collect();
//! assert_eq!(
//!     delays,
//!     [1, 2, 4, 8, 16, 16].map(Duration::from_secs).to_vec()
//! );
//! ```

use std::time::Duration;

/// Trait for reconnection strategies
///
/// `attempt` counts consecutive failures since the last successful connect,
/// starting at 0. `reset()` is called whenever a connection is established.
pub trait ReconnectionStrategy: Send + Sync {
    /// Delay before the given reconnection attempt
    fn next_delay(&mut self, attempt: u32) -> Duration;

    /// Reset any accumulated state after a successful connection
    fn reset(&mut self);
}

/// Exponential backoff with optional jitter
///
/// The delay for attempt `n` is `min_delay * 2^n`, capped at `max_delay`.
/// Jitter never pushes a delay past the cap.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    min_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff strategy
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            jitter: false,
        }
    }

    /// Add up to 25% random jitter on top of each delay
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Floor of the schedule
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Ceiling of the schedule
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        // 2^31 already saturates any sane ceiling
        let factor = 1u32 << attempt.min(31);
        self.min_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for ExponentialBackoff {
    /// 1 second doubling up to 16 seconds, no jitter
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(16))
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Duration {
        let delay = self.base_delay(attempt);

        if self.jitter {
            use rand::Rng;
            let max_jitter = (delay.as_millis() / 4) as u64;
            let jitter_ms = rand::thread_rng().gen_range(0..=max_jitter);
            return (delay + Duration::from_millis(jitter_ms)).min(self.max_delay);
        }

        delay
    }

    fn reset(&mut self) {
        // The schedule is a pure function of the attempt
    }
}

/// Fixed delay reconnection strategy
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Create a new fixed delay strategy
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&mut self, _attempt: u32) -> Duration {
        self.delay
    }

    fn reset(&mut self) {
        // No state to reset for fixed delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_schedule() {
        let mut strategy = ExponentialBackoff::default();
        let delays: Vec<u64> = (0..8).map(|a| strategy.next_delay(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 16, 16, 16]);
    }

    #[test]
    fn test_exponential_backoff_custom_floor() {
        let mut strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10));

        assert_eq!(strategy.next_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.next_delay(1), Duration::from_millis(200));
        assert_eq!(strategy.next_delay(2), Duration::from_millis(400));
        assert_eq!(strategy.next_delay(10), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_huge_attempt_saturates() {
        let mut strategy = ExponentialBackoff::default();
        assert_eq!(strategy.next_delay(u32::MAX), Duration::from_secs(16));
    }

    #[test]
    fn test_exponential_backoff_ceiling_below_floor() {
        let strategy = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(strategy.max_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_backoff_reset_keeps_schedule() {
        let mut strategy = ExponentialBackoff::default();

        strategy.next_delay(5);
        strategy.reset();
        assert_eq!(strategy.next_delay(0), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_backoff_jitter() {
        let mut strategy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
                .with_jitter();

        let delay = strategy.next_delay(0);
        assert!(delay >= Duration::from_millis(100));
        assert!(delay <= Duration::from_millis(125));
    }

    #[test]
    fn test_exponential_backoff_jitter_respects_ceiling() {
        let mut strategy = ExponentialBackoff::default().with_jitter();
        for attempt in 0..64 {
            assert!(strategy.next_delay(attempt) <= Duration::from_secs(16));
        }

        let mut pinned = ExponentialBackoff::new(Duration::from_secs(2), Duration::from_secs(2))
            .with_jitter();
        for attempt in 0..16 {
            assert_eq!(pinned.next_delay(attempt), Duration::from_secs(2));
        }
    }

    #[test]
    fn test_fixed_delay() {
        let mut strategy = FixedDelay::new(Duration::from_secs(1));

        assert_eq!(strategy.next_delay(0), Duration::from_secs(1));
        assert_eq!(strategy.next_delay(1), Duration::from_secs(1));
        assert_eq!(strategy.next_delay(50), Duration::from_secs(1));
    }
}
