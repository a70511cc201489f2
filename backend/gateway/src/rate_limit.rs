//! Per-IP rate limiting for mutating endpoints.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A naive sliding-window rate limiter keyed by caller IP.
#[derive(Clone)]
pub struct RateLimiter {
    // ip_address -> (request_count, window_start)
    limits: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(60, 60)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Check if a request from the given IP is allowed.
    pub async fn check_limit(&self, ip: &str) -> bool {
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        let state = limits.entry(ip.to_string()).or_insert((0, now));

        if now.duration_since(state.1) > self.window {
            // Reset window
            state.0 = 1;
            state.1 = now;
            debug!("rate limit window reset for {}", ip);
            true
        } else {
            state.0 += 1;
            if state.0 > self.max_requests {
                warn!("rate limit exceeded for {}", ip);
                false
            } else {
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_limit_then_blocks() {
        let limiter = RateLimiter::new(3, 60);
        for _ in 0..3 {
            assert!(limiter.check_limit("1.2.3.4").await);
        }
        assert!(!limiter.check_limit("1.2.3.4").await);
    }

    #[tokio::test]
    async fn limits_are_per_ip() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check_limit("1.1.1.1").await);
        assert!(!limiter.check_limit("1.1.1.1").await);
        assert!(limiter.check_limit("2.2.2.2").await);
    }
}
