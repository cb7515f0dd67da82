//! In-process sliding-window rate limiter.
//!
//! Tracks request instants per key and rejects a request when the key
//! already has `max_requests` hits inside the trailing window. Rejected
//! requests are not recorded, so a caller that backs off regains capacity
//! as its oldest hits age out.
//!
//! State lives in this process only. The API crate offers a Postgres
//! backed alternative for multi-instance deployments.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed inside the window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
    /// Run a full sweep of idle keys every N checks.
    pub cleanup_interval: u64,
    /// Hard cap on tracked keys. New keys beyond the cap are rejected.
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: crate::push::DEFAULT_RATE_LIMIT_MAX,
            window: Duration::from_secs(crate::push::DEFAULT_RATE_LIMIT_WINDOW_SECS),
            cleanup_interval: 100,
            max_tracked_keys: 10_000,
        }
    }
}

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request recorded; `remaining` more fit in the current window.
    Allowed { remaining: u32 },
    /// Request rejected; capacity returns after `retry_after`.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
    checks: AtomicU64,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and record a request for `key` at the current instant.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Check and record a request for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let count = self.checks.fetch_add(1, Ordering::Relaxed);
        let mut hits = self
            .hits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if count > 0 && count % self.config.cleanup_interval == 0 {
            Self::sweep(&mut hits, now, self.config.window);
        }

        if !hits.contains_key(key) && hits.len() >= self.config.max_tracked_keys {
            Self::sweep(&mut hits, now, self.config.window);
            if hits.len() >= self.config.max_tracked_keys {
                return RateDecision::Limited {
                    retry_after: self.config.window,
                };
            }
        }

        let window = self.config.window;
        let entry = hits.entry(key.to_string()).or_default();
        while let Some(&oldest) = entry.front() {
            if now.saturating_duration_since(oldest) >= window {
                entry.pop_front();
            } else {
                break;
            }
        }

        let max = self.config.max_requests as usize;
        if entry.len() >= max {
            let retry_after = entry
                .front()
                .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(window);
            return RateDecision::Limited { retry_after };
        }

        entry.push_back(now);
        RateDecision::Allowed {
            remaining: (max - entry.len()) as u32,
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn sweep(hits: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
        hits.retain(|_, instants| {
            instants
                .back()
                .is_some_and(|&last| now.saturating_duration_since(last) < window)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(window_secs),
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn twenty_first_request_in_a_minute_is_limited() {
        let limiter = limiter(20, 60);
        let start = Instant::now();
        for i in 0..20 {
            let at = start + Duration::from_secs(i);
            assert!(limiter.check_at("caller", at).is_allowed(), "request {}", i + 1);
        }
        let decision = limiter.check_at("caller", start + Duration::from_secs(30));
        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn capacity_returns_as_hits_age_out() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_allowed());
        assert!(limiter.check_at("k", start + Duration::from_secs(10)).is_allowed());
        assert!(!limiter.check_at("k", start + Duration::from_secs(59)).is_allowed());
        // The first hit is exactly one window old and no longer counts.
        assert!(limiter.check_at("k", start + Duration::from_secs(60)).is_allowed());
    }

    #[test]
    fn rejected_requests_are_not_recorded() {
        let limiter = limiter(1, 60);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_allowed());
        for s in 1..50 {
            assert!(!limiter.check_at("k", start + Duration::from_secs(s)).is_allowed());
        }
        assert!(limiter.check_at("k", start + Duration::from_secs(60)).is_allowed());
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_at("a", now).is_allowed());
        assert!(limiter.check_at("b", now).is_allowed());
        assert!(!limiter.check_at("a", now).is_allowed());
    }

    #[test]
    fn remaining_counts_down() {
        let limiter = limiter(3, 60);
        let now = Instant::now();
        assert_eq!(limiter.check_at("k", now), RateDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.check_at("k", now), RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at("k", now), RateDecision::Allowed { remaining: 0 });
    }

    #[test]
    fn tracked_key_cap_is_enforced_after_sweep() {
        let limiter = SlidingWindowLimiter::new(RateLimitConfig {
            max_requests: 5,
            window: Duration::from_secs(60),
            cleanup_interval: 1_000,
            max_tracked_keys: 2,
        });
        let start = Instant::now();
        assert!(limiter.check_at("a", start).is_allowed());
        assert!(limiter.check_at("b", start).is_allowed());
        assert!(!limiter.check_at("c", start).is_allowed());
        assert_eq!(limiter.tracked_keys(), 2);

        // Once the old keys go idle, the sweep makes room.
        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at("c", later).is_allowed());
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
