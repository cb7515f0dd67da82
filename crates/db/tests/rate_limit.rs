//! Integration tests for the shared `rate_limit_hits` limiter.

use leaders_db::repositories::RateLimitRepo;
use sqlx::PgPool;

const MAX: u32 = 20;
const WINDOW_SECS: u64 = 60;

async fn hits(pool: &PgPool, bucket: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM rate_limit_hits WHERE bucket = $1")
        .bind(bucket)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn insert_aged_hit(pool: &PgPool, bucket: &str, age_secs: f64) {
    sqlx::query(
        "INSERT INTO rate_limit_hits (bucket, hit_at)
         VALUES ($1, clock_timestamp() - make_interval(secs => $2))",
    )
    .bind(bucket)
    .bind(age_secs)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn twenty_first_hit_in_window_is_limited(pool: PgPool) {
    for used in 0..MAX {
        let hit = RateLimitRepo::hit(&pool, "push:caller", MAX, WINDOW_SECS)
            .await
            .unwrap();
        assert!(hit.allowed, "hit {} should be allowed", used + 1);
        assert_eq!(hit.remaining, MAX - used - 1);
    }

    let limited = RateLimitRepo::hit(&pool, "push:caller", MAX, WINDOW_SECS)
        .await
        .unwrap();
    assert!(!limited.allowed);
    assert_eq!(limited.remaining, 0);
    assert!((1..=WINDOW_SECS).contains(&limited.retry_after_secs));

    // Buckets are independent.
    let other = RateLimitRepo::hit(&pool, "push:other", MAX, WINDOW_SECS)
        .await
        .unwrap();
    assert!(other.allowed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejected_hits_are_not_recorded(pool: PgPool) {
    for _ in 0..MAX {
        RateLimitRepo::hit(&pool, "push:caller", MAX, WINDOW_SECS)
            .await
            .unwrap();
    }
    for _ in 0..5 {
        let hit = RateLimitRepo::hit(&pool, "push:caller", MAX, WINDOW_SECS)
            .await
            .unwrap();
        assert!(!hit.allowed);
    }
    assert_eq!(hits(&pool, "push:caller").await, i64::from(MAX));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hits_older_than_the_window_do_not_count(pool: PgPool) {
    for _ in 0..MAX {
        insert_aged_hit(&pool, "push:caller", 90.0).await;
    }
    let hit = RateLimitRepo::hit(&pool, "push:caller", MAX, WINDOW_SECS)
        .await
        .unwrap();
    assert!(hit.allowed);
    assert_eq!(hit.remaining, MAX - 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_after_tracks_the_oldest_hit(pool: PgPool) {
    insert_aged_hit(&pool, "push:caller", 45.0).await;
    let limited = RateLimitRepo::hit(&pool, "push:caller", 1, WINDOW_SECS)
        .await
        .unwrap();
    assert!(!limited.allowed);
    assert!((1..=16).contains(&limited.retry_after_secs));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_deletes_only_expired_rows(pool: PgPool) {
    insert_aged_hit(&pool, "push:a", 120.0).await;
    insert_aged_hit(&pool, "push:b", 61.0).await;
    RateLimitRepo::hit(&pool, "push:c", MAX, WINDOW_SECS)
        .await
        .unwrap();

    let deleted = RateLimitRepo::purge_expired(&pool, WINDOW_SECS).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(hits(&pool, "push:a").await, 0);
    assert_eq!(hits(&pool, "push:b").await, 0);
    assert_eq!(hits(&pool, "push:c").await, 1);
}
