//! Sliding-window admission control per client identity.
//!
//! Each client id keeps a window of recent request timestamps, pruned lazily
//! on access. The gate is a plain boolean check performed before the handler
//! runs; the limiter itself never suspends, so it decorates synchronous and
//! async handlers identically.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

/// Idle-client sweep threshold. Stale windows for clients that stopped
/// sending are dropped opportunistically once the map grows past this.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `client_id` and report whether the client has
    /// exceeded its window. `max_requests == 0` disables limiting entirely
    /// and records nothing.
    pub fn is_limited(&self, client_id: &str) -> bool {
        if self.max_requests == 0 {
            return false;
        }

        let now = Instant::now();
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");

        if requests.len() > SWEEP_THRESHOLD {
            let window = self.window;
            requests.retain(|_, stamps| {
                stamps.retain(|t| now.duration_since(*t) < window);
                !stamps.is_empty()
            });
        }

        let stamps = requests.entry(client_id.to_string()).or_default();
        stamps.retain(|t| now.duration_since(*t) < self.window);
        stamps.push(now);

        let limited = stamps.len() > self.max_requests;
        if limited {
            warn!(client_id, "rate limit exceeded");
        }
        limited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_within_window_is_limited() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(!limiter.is_limited("client-a"));
        assert!(limiter.is_limited("client-a"));
    }

    #[test]
    fn window_elapse_resets_the_count() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(!limiter.is_limited("client-a"));
        assert!(limiter.is_limited("client-a"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(!limiter.is_limited("client-a"));
    }

    #[test]
    fn zero_max_requests_disables_limiting() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        for _ in 0..100 {
            assert!(!limiter.is_limited("client-a"));
        }
        // Nothing is recorded for disabled limiters.
        assert!(limiter.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(!limiter.is_limited("client-a"));
        assert!(!limiter.is_limited("client-b"));
        assert!(limiter.is_limited("client-a"));
        assert!(limiter.is_limited("client-b"));
    }

    #[test]
    fn concurrent_access_is_safe() {
        use std::sync::Arc;
        let limiter = Arc::new(RateLimiter::new(1000, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        limiter.is_limited(&format!("client-{}", i % 2));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // 400 total requests across two clients, all under the cap.
        let requests = limiter.requests.lock().unwrap();
        assert_eq!(requests.values().map(Vec::len).sum::<usize>(), 400);
    }
}
