//! Push send rate limiting.
//!
//! [`RateLimiter`] is the seam handlers call; [`build_rate_limiter`] picks
//! the backend from configuration:
//!
//! - [`MemoryRateLimiter`] -- in-process sliding window. Limits are per
//!   instance and reset on restart.
//! - [`PgRateLimiter`] -- counters in the shared `rate_limit_hits` table,
//!   so every instance sees the same window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leaders_core::error::CoreError;
use leaders_core::rate_limit::{RateDecision, RateLimitConfig, SlidingWindowLimiter};
use leaders_db::repositories::RateLimitRepo;
use leaders_db::DbPool;

use crate::config::{RateLimitBackend, RateLimitSettings};
use crate::error::AppError;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check `key` and record the hit when it is allowed.
    async fn check(&self, key: &str) -> Result<RateDecision, sqlx::Error>;
}

/// Check `key`, turning a rejection into a 429 error.
pub async fn enforce(limiter: &dyn RateLimiter, key: &str) -> Result<(), AppError> {
    match limiter.check(key).await? {
        RateDecision::Allowed { .. } => Ok(()),
        RateDecision::Limited { retry_after } => {
            tracing::info!(key, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
            Err(AppError::Core(CoreError::RateLimited {
                retry_after_secs: ceil_secs(retry_after),
            }))
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

pub fn build_rate_limiter(settings: &RateLimitSettings, pool: DbPool) -> Arc<dyn RateLimiter> {
    match settings.backend {
        RateLimitBackend::Memory => Arc::new(MemoryRateLimiter::new(settings)),
        RateLimitBackend::Postgres => Arc::new(PgRateLimiter::new(pool, settings)),
    }
}

// ---------------------------------------------------------------------------
// Memory backend
// ---------------------------------------------------------------------------

pub struct MemoryRateLimiter {
    inner: SlidingWindowLimiter,
}

impl MemoryRateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            inner: SlidingWindowLimiter::new(RateLimitConfig {
                max_requests: settings.max_requests,
                window: Duration::from_secs(settings.window_secs),
                ..RateLimitConfig::default()
            }),
        }
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateDecision, sqlx::Error> {
        Ok(self.inner.check(key))
    }
}

// ---------------------------------------------------------------------------
// Postgres backend
// ---------------------------------------------------------------------------

pub struct PgRateLimiter {
    pool: DbPool,
    max_requests: u32,
    window_secs: u64,
}

impl PgRateLimiter {
    pub fn new(pool: DbPool, settings: &RateLimitSettings) -> Self {
        Self {
            pool,
            max_requests: settings.max_requests,
            window_secs: settings.window_secs,
        }
    }

    /// Delete hits older than the window across all buckets.
    pub async fn purge(&self) -> Result<u64, sqlx::Error> {
        RateLimitRepo::purge_expired(&self.pool, self.window_secs).await
    }
}

/// Spawn a task that deletes expired hits once per window.
///
/// Runs until aborted through the returned handle.
pub fn start_purge(limiter: PgRateLimiter) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(limiter.window_secs));
        loop {
            interval.tick().await;
            match limiter.purge().await {
                Ok(0) => {}
                Ok(deleted) => tracing::debug!(deleted, "Purged expired rate limit hits"),
                Err(e) => tracing::warn!(error = %e, "Rate limit purge failed"),
            }
        }
    })
}

#[async_trait]
impl RateLimiter for PgRateLimiter {
    async fn check(&self, key: &str) -> Result<RateDecision, sqlx::Error> {
        let hit = RateLimitRepo::hit(&self.pool, key, self.max_requests, self.window_secs).await?;
        Ok(if hit.allowed {
            RateDecision::Allowed {
                remaining: hit.remaining,
            }
        } else {
            RateDecision::Limited {
                retry_after: Duration::from_secs(hit.retry_after_secs),
            }
        })
    }
}
