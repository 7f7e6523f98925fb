//! Rate limiting middleware
//!
//! One token bucket per client address. A bucket holds `max_requests` tokens
//! and refills at `max_requests / window` tokens per second.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::config::RateLimitSettings;
use crate::error::ApiError;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Rate limiter
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { buckets: Mutex::new(HashMap::new()), config }
    }

    /// Check if request is allowed
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        let mut buckets = self.buckets.lock();

        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(key) {
            buckets.retain(|_, bucket| !bucket.is_full(now, &self.config));
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.burst, now));

        if bucket.try_acquire(now, &self.config) {
            RateLimitResult::Allowed { remaining: bucket.available.floor() as u32 }
        } else {
            RateLimitResult::Limited { retry_after: bucket.time_to_next_token(&self.config) }
        }
    }
}

/// Rate limit config
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub refill_per_second: f64,
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        let window = settings.window_secs.max(1) as f64;
        Self {
            burst: settings.max_requests,
            refill_per_second: f64::from(settings.max_requests) / window,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&RateLimitSettings::default())
    }
}

/// Token bucket
struct TokenBucket {
    available: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(burst: u32, now: Instant) -> Self {
        Self { available: f64::from(burst), last_refill: now }
    }

    fn try_acquire(&mut self, now: Instant, config: &RateLimitConfig) -> bool {
        self.refill(now, config);
        if self.available >= 1.0 {
            self.available -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant, config: &RateLimitConfig) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.available = (self.available + elapsed * config.refill_per_second).min(f64::from(config.burst));
        self.last_refill = now;
    }

    fn is_full(&self, now: Instant, config: &RateLimitConfig) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.available + elapsed * config.refill_per_second >= f64::from(config.burst)
    }

    fn time_to_next_token(&self, config: &RateLimitConfig) -> Duration {
        if config.refill_per_second <= 0.0 {
            return Duration::MAX;
        }
        let secs = (1.0 - self.available).max(0.0) / config.refill_per_second;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Rate limit result
#[derive(Debug)]
pub enum RateLimitResult {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Axum middleware keyed on the peer address.
///
/// Requests without connection info (in-process test transports) share one
/// bucket.
pub async fn rate_limit(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    let key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "local".to_string());

    match limiter.check(&key) {
        RateLimitResult::Allowed { remaining } => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        RateLimitResult::Limited { retry_after } => {
            tracing::warn!(client = %key, "rate limit exceeded");
            ApiError::RateLimited { retry_after }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(burst: u32, refill_per_second: f64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig { burst, refill_per_second })
    }

    #[test]
    fn test_burst_then_limited() {
        let limiter = limiter(3, 0.001);
        let now = Instant::now();
        for expected in [2, 1, 0] {
            assert!(matches!(limiter.check_at("a", now), RateLimitResult::Allowed { remaining } if remaining == expected));
        }
        assert!(matches!(limiter.check_at("a", now), RateLimitResult::Limited { .. }));
        assert!(matches!(limiter.check_at("b", now), RateLimitResult::Allowed { .. }));
    }

    #[test]
    fn test_refill_over_time() {
        let limiter = limiter(1, 1.0);
        let now = Instant::now();
        assert!(matches!(limiter.check_at("a", now), RateLimitResult::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), RateLimitResult::Limited { .. }));
        let later = now + Duration::from_millis(1_100);
        assert!(matches!(limiter.check_at("a", later), RateLimitResult::Allowed { .. }));
    }

    #[test]
    fn test_extreme_window_saturates_retry_after() {
        let limiter = RateLimiter::new((&RateLimitSettings { window_secs: u64::MAX, max_requests: 1 }).into());
        let now = Instant::now();
        assert!(matches!(limiter.check_at("a", now), RateLimitResult::Allowed { .. }));
        match limiter.check_at("a", now) {
            RateLimitResult::Limited { retry_after } => assert_eq!(retry_after, Duration::MAX),
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[test]
    fn test_window_settings() {
        let config = RateLimitConfig::from(&RateLimitSettings { window_secs: 900, max_requests: 100 });
        assert_eq!(config.burst, 100);
        assert!((config.refill_per_second - 100.0 / 900.0).abs() < f64::EPSILON);
    }
}
