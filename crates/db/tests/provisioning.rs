//! Integration tests for transactional brand provisioning.

use assert_matches::assert_matches;
use leaders_core::error::CoreError;
use leaders_core::provisioning::BrandProvisioning;
use leaders_db::error::DbError;
use leaders_db::models::brand::ProvisionOutcome;
use leaders_db::models::user::CreateAccount;
use leaders_db::repositories::{BrandRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo";

fn provisioning(email: &str, brand: &str) -> BrandProvisioning {
    BrandProvisioning {
        brand_name: brand.to_string(),
        industry: Some("Beauty".to_string()),
        website: Some("https://glowlabs.example".to_string()),
        manager_name: "Dana Reyes".to_string(),
        manager_email: email.to_string(),
        manager_password: "correct-horse-battery".to_string(),
    }
}

async fn admin(pool: &PgPool) -> uuid::Uuid {
    let (user, _) = UserRepo::create_account(
        pool,
        &CreateAccount {
            email: "ops@leaders.example".to_string(),
            password_hash: HASH.to_string(),
            display_name: "Ops".to_string(),
            role: "admin".to_string(),
        },
    )
    .await
    .unwrap();
    user.id
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn provisioning_writes_every_row(pool: PgPool) {
    let actor = admin(&pool).await;
    let outcome = BrandRepo::provision(
        &pool,
        &provisioning("dana@glowlabs.example", "Glow Labs"),
        HASH,
        actor,
        None,
    )
    .await
    .unwrap();

    let result = assert_matches!(outcome, ProvisionOutcome::Created(r) => r);
    assert_eq!(result.manager.role, "brand_manager");
    assert!(BrandRepo::is_member(&pool, result.brand.id, result.manager.id)
        .await
        .unwrap());
    assert_eq!(count(&pool, "brand_users").await, 1);

    let audit: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE action = 'brand.provisioned' AND entity_id = $1",
    )
    .bind(result.brand.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(audit, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_manager_email_leaves_no_orphans(pool: PgPool) {
    let actor = admin(&pool).await;
    BrandRepo::provision(&pool, &provisioning("dana@glowlabs.example", "Glow Labs"), HASH, actor, None)
        .await
        .unwrap();

    let err = BrandRepo::provision(
        &pool,
        &provisioning("dana@glowlabs.example", "Second Brand"),
        HASH,
        actor,
        None,
    )
    .await
    .unwrap_err();
    let err = assert_matches!(err, DbError::Sqlx(e) => e);
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint().map(str::to_string));
    assert_eq!(constraint.as_deref(), Some("uq_users_email"));

    assert_eq!(count(&pool, "brands").await, 1);
    assert_eq!(count(&pool, "brand_members").await, 1);
    assert_eq!(count(&pool, "brand_users").await, 1);
    // The admin plus the first manager.
    assert_eq!(count(&pool, "profiles").await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn idempotency_key_replays_without_writing(pool: PgPool) {
    let actor = admin(&pool).await;
    let request = provisioning("dana@glowlabs.example", "Glow Labs");

    let first = BrandRepo::provision(&pool, &request, HASH, actor, Some("glow-001"))
        .await
        .unwrap();
    let created = assert_matches!(first, ProvisionOutcome::Created(r) => r);

    let second = BrandRepo::provision(&pool, &request, HASH, actor, Some("glow-001"))
        .await
        .unwrap();
    let replayed = assert_matches!(second, ProvisionOutcome::Replayed(r) => r);

    assert_eq!(replayed.brand.id, created.brand.id);
    assert_eq!(replayed.manager.id, created.manager.id);
    assert_eq!(count(&pool, "brands").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reused_key_with_different_request_is_a_conflict(pool: PgPool) {
    let actor = admin(&pool).await;
    BrandRepo::provision(
        &pool,
        &provisioning("dana@glowlabs.example", "Glow Labs"),
        HASH,
        actor,
        Some("glow-002"),
    )
    .await
    .unwrap();

    let err = BrandRepo::provision(
        &pool,
        &provisioning("lee@northwind.example", "Northwind"),
        HASH,
        actor,
        Some("glow-002"),
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::Conflict(_)));
    assert_eq!(count(&pool, "brands").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_requests_with_one_key_create_once(pool: PgPool) {
    let actor = admin(&pool).await;
    let request = provisioning("dana@glowlabs.example", "Glow Labs");

    let attempts = (0..4).map(|_| {
        let pool = pool.clone();
        let request = request.clone();
        tokio::spawn(async move {
            BrandRepo::provision(&pool, &request, HASH, actor, Some("glow-003")).await
        })
    });
    let outcomes: Vec<ProvisionOutcome> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let created: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match o {
            ProvisionOutcome::Created(r) => Some(r.brand.id),
            ProvisionOutcome::Replayed(_) => None,
        })
        .collect();
    assert_eq!(created.len(), 1);
    for outcome in &outcomes {
        if let ProvisionOutcome::Replayed(r) = outcome {
            assert_eq!(r.brand.id, created[0]);
        }
    }
    assert_eq!(count(&pool, "brands").await, 1);
    assert_eq!(count(&pool, "idempotency_keys").await, 1);
}
