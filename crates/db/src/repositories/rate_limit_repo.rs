//! Shared sliding-window counter on the `rate_limit_hits` table.
//!
//! Used when several API instances must enforce one limit. Each check runs
//! in its own transaction under an advisory lock on the bucket, so
//! concurrent checks for the same bucket serialise.

use sqlx::PgPool;

/// Outcome of one shared-limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHit {
    pub allowed: bool,
    pub remaining: u32,
    /// Seconds until capacity returns; zero when allowed.
    pub retry_after_secs: u64,
}

pub struct RateLimitRepo;

impl RateLimitRepo {
    /// Check `bucket` and record a hit if it is under `max` in the last
    /// `window_secs`. Rejected checks are not recorded.
    pub async fn hit(
        pool: &PgPool,
        bucket: &str,
        max: u32,
        window_secs: u64,
    ) -> Result<RateLimitHit, sqlx::Error> {
        let window = window_secs as f64;
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(bucket)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM rate_limit_hits
             WHERE bucket = $1 AND hit_at <= clock_timestamp() - make_interval(secs => $2)",
        )
        .bind(bucket)
        .bind(window)
        .execute(&mut *tx)
        .await?;

        let (count, retry_after): (i64, Option<f64>) = sqlx::query_as(
            "SELECT COUNT(*)::BIGINT,
                    EXTRACT(EPOCH FROM (MIN(hit_at) + make_interval(secs => $2) - clock_timestamp()))::float8
             FROM rate_limit_hits WHERE bucket = $1",
        )
        .bind(bucket)
        .bind(window)
        .fetch_one(&mut *tx)
        .await?;

        let used = u32::try_from(count).unwrap_or(u32::MAX);
        if used >= max {
            tx.commit().await?;
            let secs = retry_after.unwrap_or(window).ceil().max(1.0) as u64;
            return Ok(RateLimitHit {
                allowed: false,
                remaining: 0,
                retry_after_secs: secs,
            });
        }

        sqlx::query("INSERT INTO rate_limit_hits (bucket) VALUES ($1)")
            .bind(bucket)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(RateLimitHit {
            allowed: true,
            remaining: max - used - 1,
            retry_after_secs: 0,
        })
    }

    /// Delete hits older than `window_secs` across all buckets.
    pub async fn purge_expired(pool: &PgPool, window_secs: u64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM rate_limit_hits WHERE hit_at <= clock_timestamp() - make_interval(secs => $1)",
        )
        .bind(window_secs as f64)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
