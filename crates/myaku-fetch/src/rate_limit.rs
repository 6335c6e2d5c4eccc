use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// The per-host minimum/maximum inter-request delay. A new delay is drawn
/// uniformly from `[min_wait, max_wait)` after every request to a host, per
/// `spec.md` §4.3.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        RateLimitPolicy { min_wait: Duration::from_secs(3), max_wait: Duration::from_secs(7) }
    }
}

impl RateLimitPolicy {
    pub fn new(min_wait: Duration, max_wait: Duration) -> Self {
        RateLimitPolicy { min_wait, max_wait }
    }

    fn next_delay(&self) -> Duration {
        if self.max_wait <= self.min_wait {
            return self.min_wait;
        }
        let span = self.max_wait - self.min_wait;
        let jitter_nanos = rand::thread_rng().gen_range(0..=span.as_nanos());
        self.min_wait + Duration::from_nanos(jitter_nanos as u64)
    }
}

/// Per-host "earliest next request time" state, shared across every caller
/// of a [`crate::RateLimitedFetcher`]. Kept behind a `tokio::Mutex` rather
/// than a `std::sync::Mutex` since the critical section spans an `.await`
/// (the sleep itself happens outside the lock, but scheduling the next slot
/// does not).
#[derive(Default)]
pub struct HostRateLimiter {
    policy: RateLimitPolicy,
    next_allowed: Mutex<HashMap<String, Instant>>,
}

impl HostRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        HostRateLimiter { policy, next_allowed: Mutex::new(HashMap::new()) }
    }

    /// Blocks the caller until `host`'s next permitted request time, then
    /// reserves a fresh slot for the host before returning.
    pub async fn wait_for_slot(&self, host: &str) {
        let now = Instant::now();
        let wait_until = {
            let mut guard = self.next_allowed.lock().await;
            let wait_until = guard.get(host).copied().unwrap_or(now);
            guard.insert(host.to_string(), wait_until.max(now) + self.policy.next_delay());
            wait_until
        };
        if wait_until > now {
            tokio::time::sleep_until(wait_until).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn serializes_requests_to_the_same_host() {
        let limiter = HostRateLimiter::new(RateLimitPolicy::new(Duration::from_millis(100), Duration::from_millis(100)));
        let start = Instant::now();
        limiter.wait_for_slot("example.test").await;
        limiter.wait_for_slot("example.test").await;
        assert!(Instant::now() >= start + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn different_hosts_do_not_block_each_other() {
        let limiter = HostRateLimiter::new(RateLimitPolicy::new(Duration::from_secs(5), Duration::from_secs(5)));
        let start = Instant::now();
        limiter.wait_for_slot("a.test").await;
        limiter.wait_for_slot("b.test").await;
        assert!(Instant::now() - start < Duration::from_secs(1));
    }
}
