//! Request pacing.
//!
//! A token bucket with a burst of one: the first caller goes through
//! immediately, each following caller waits until `interval` has passed since
//! the previous permit. Uses the governor crate.

use governor::{Quota, RateLimiter};
use std::time::Duration;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub struct Pacer {
    limiter: Option<DefaultRateLimiter>,
    interval: Duration,
}

impl Pacer {
    /// A zero interval yields a pacer that never waits.
    pub fn new(interval: Duration) -> Self {
        Self {
            limiter: Quota::with_period(interval).map(RateLimiter::direct),
            interval,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait for the next permit.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("interval", &self.interval)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_spacing_between_permits() {
        let pacer = Pacer::new(Duration::from_millis(100));

        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        let elapsed = start.elapsed();

        // First permit is immediate, the next two wait one interval each
        assert!(elapsed >= Duration::from_millis(190), "Pacing not applied: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = Pacer::disabled();
        assert!(!pacer.is_enabled());

        let start = Instant::now();
        for _ in 0..50 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
