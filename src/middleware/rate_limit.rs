//! Per-IP rate limiting for the public authentication endpoints.
//!
//! Login, register, and refresh are the only endpoints an attacker can
//! hammer without credentials, so they get a token-bucket limiter keyed
//! by client IP. This is deliberately in-process (single instance);
//! distributed limiting is out of scope.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter keyed by an arbitrary string (here: client IP).
///
/// Each key gets `capacity` burst tokens which refill continuously at
/// `refill_per_sec`. A request costs one token; an empty bucket means 429.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    capacity: f64,
    refill_per_sec: f64,
}

/// Map size at which inserting a new key first sweeps refilled buckets.
const SWEEP_THRESHOLD: usize = 1024;

impl RateLimiter {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity,
            refill_per_sec,
        }
    }

    /// Take one token for `key`, returning whether the request is allowed.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        // A poisoned lock still guards consistent data (token counts); keep
        // serving rather than failing every auth request after one panic.
        let mut lock = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // A full bucket behaves exactly like an absent one, so evicting it
        // is lossless. Sweeping only when a new key arrives past the
        // threshold keeps the map bounded by the set of recently-throttled
        // clients instead of every IP ever seen.
        if lock.len() >= SWEEP_THRESHOLD && !lock.contains_key(key) {
            let (capacity, refill_per_sec) = (self.capacity, self.refill_per_sec);
            lock.retain(|_, bucket| {
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens + elapsed * refill_per_sec < capacity
            });
        }

        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Axum middleware applying the login limiter to a route group.
///
/// The client key is the peer address from `ConnectInfo`; the server is
/// started with `into_make_service_with_connect_info` so it is always present.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = addr.ip().to_string();
    if !state.login_limiter.allow(&key) {
        tracing::warn!(client = %key, "auth rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_up_to_capacity_then_rejects() {
        let limiter = RateLimiter::new(5.0, 0.0);
        for _ in 0..5 {
            assert!(limiter.allow("10.0.0.1"));
        }
        assert!(!limiter.allow("10.0.0.1"));
    }

    #[test]
    fn keys_are_isolated() {
        let limiter = RateLimiter::new(1.0, 0.0);
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        // A different client still has its full budget.
        assert!(limiter.allow("10.0.0.2"));
    }

    #[test]
    fn tokens_refill_over_time() {
        let limiter = RateLimiter::new(1.0, 1000.0);
        assert!(limiter.allow("10.0.0.1"));
        // At 1000 tokens/sec even a few milliseconds refill the bucket.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(limiter.allow("10.0.0.1"));
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new(2.0, 1000.0);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
    }

    #[test]
    fn refilled_buckets_are_swept_once_the_map_grows() {
        let limiter = RateLimiter::new(1.0, 1000.0);
        for i in 0..SWEEP_THRESHOLD {
            assert!(limiter.allow(&format!("10.0.{}.{}", i / 256, i % 256)));
        }
        // At 1000 tokens/sec everything above refills almost immediately.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(limiter.allow("192.168.0.1"));
        assert!(limiter.bucket_count() < SWEEP_THRESHOLD);
    }

    #[test]
    fn a_poisoned_lock_does_not_break_the_limiter() {
        let limiter = std::sync::Arc::new(RateLimiter::new(2.0, 0.0));
        let other = limiter.clone();
        let _ = std::thread::spawn(move || {
            let _guard = other.buckets.lock().unwrap();
            panic!("poisoning the limiter");
        })
        .join();
        assert!(limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
    }
}
