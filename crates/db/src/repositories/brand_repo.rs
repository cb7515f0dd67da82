//! Repository for `brands`, `brand_members` and `brand_users`, plus the
//! transactional brand provisioning workflow.

use leaders_core::audit::{actions, entities};
use leaders_core::error::CoreError;
use leaders_core::provisioning::BrandProvisioning;
use leaders_core::roles::ROLE_BRAND_MANAGER;
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::audit::CreateAuditLog;
use crate::models::brand::{
    Brand, BrandMember, ProvisionOutcome, ProvisionedBrand, ProvisionedManager, UpdateBrand,
};
use crate::repositories::{AuditLogRepo, ProfileRepo, UserRepo};

const COLUMNS: &str = "id, name, industry, website, verified_at, created_at, updated_at";

const MEMBER_COLUMNS: &str = "brand_id, user_id, role, created_at";

/// Idempotency scope for `POST /api/admin/create-brand`.
pub const PROVISION_SCOPE: &str = "admin.create-brand";

/// Unique constraints a concurrent request with the same key can trip.
const REPLAY_CONSTRAINTS: &[&str] = &["uq_users_email", "uq_idempotency_keys"];

/// A provisioning result stored against an idempotency key.
#[derive(Debug, sqlx::FromRow)]
struct StoredProvision {
    request_hash: String,
    response: serde_json::Value,
}

pub struct BrandRepo;

impl BrandRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE id = $1");
        sqlx::query_as::<_, Brand>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands ORDER BY name");
        sqlx::query_as::<_, Brand>(&query).fetch_all(pool).await
    }

    /// Brands the user is a member of.
    pub async fn list_for_member(pool: &PgPool, user_id: DbId) -> Result<Vec<Brand>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM brands
             WHERE id IN (SELECT brand_id FROM brand_members WHERE user_id = $1)
             ORDER BY name"
        );
        sqlx::query_as::<_, Brand>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_members(
        pool: &PgPool,
        brand_id: DbId,
    ) -> Result<Vec<BrandMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM brand_members WHERE brand_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, BrandMember>(&query)
            .bind(brand_id)
            .fetch_all(pool)
            .await
    }

    pub async fn is_member(pool: &PgPool, brand_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM brand_members WHERE brand_id = $1 AND user_id = $2)",
        )
        .bind(brand_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Update a brand. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBrand,
        actor_id: DbId,
    ) -> Result<Option<Brand>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE brands SET
                name = COALESCE($2, name),
                industry = COALESCE($3, industry),
                website = COALESCE($4, website)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let brand = sqlx::query_as::<_, Brand>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.industry)
            .bind(&input.website)
            .fetch_optional(&mut *tx)
            .await?;
        if brand.is_some() {
            AuditLogRepo::insert(
                &mut *tx,
                &CreateAuditLog::new(Some(actor_id), actions::ENTITY_UPDATE, entities::BRAND, id),
            )
            .await?;
        }
        tx.commit().await?;
        Ok(brand)
    }

    /// Mark a brand verified. Re-verifying keeps the original timestamp.
    pub async fn verify(pool: &PgPool, id: DbId, actor_id: DbId) -> Result<Option<Brand>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE brands SET verified_at = COALESCE(verified_at, NOW())
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let brand = sqlx::query_as::<_, Brand>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if brand.is_some() {
            AuditLogRepo::insert(
                &mut *tx,
                &CreateAuditLog::new(Some(actor_id), actions::BRAND_VERIFIED, entities::BRAND, id),
            )
            .await?;
        }
        tx.commit().await?;
        Ok(brand)
    }

    // -----------------------------------------------------------------------
    // Provisioning
    // -----------------------------------------------------------------------

    /// Look up a stored provisioning result for an idempotency key.
    ///
    /// A key first used with a different request is a conflict.
    pub async fn find_provisioned(
        pool: &PgPool,
        idempotency_key: &str,
        request_hash: &str,
    ) -> Result<Option<ProvisionedBrand>, DbError> {
        let stored = sqlx::query_as::<_, StoredProvision>(
            "SELECT request_hash, response FROM idempotency_keys WHERE scope = $1 AND key = $2",
        )
        .bind(PROVISION_SCOPE)
        .bind(idempotency_key)
        .fetch_optional(pool)
        .await?;

        let Some(stored) = stored else {
            return Ok(None);
        };
        if stored.request_hash != request_hash {
            return Err(CoreError::Conflict(
                "Idempotency-Key was already used with a different request".into(),
            )
            .into());
        }
        let brand = serde_json::from_value::<ProvisionedBrand>(stored.response)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Some(brand))
    }

    /// Provision a brand and its manager in one transaction.
    ///
    /// Creates the identity, the `brand_manager` profile, the brand, the
    /// membership row, the `brand_users` row, an audit row and (when a key
    /// is given) the idempotency record. Any failure, such as a duplicate
    /// manager email, rolls everything back.
    ///
    /// A key that was already used returns the stored result without
    /// writing anything. This includes a request that lost a race with an
    /// in-flight one carrying the same key.
    pub async fn provision(
        pool: &PgPool,
        input: &BrandProvisioning,
        password_hash: &str,
        actor_id: DbId,
        idempotency_key: Option<&str>,
    ) -> Result<ProvisionOutcome, DbError> {
        let Some(key) = idempotency_key else {
            let result = Self::provision_tx(pool, input, password_hash, actor_id, None).await?;
            return Ok(ProvisionOutcome::Created(result));
        };

        let request_hash = input.fingerprint();
        if let Some(stored) = Self::find_provisioned(pool, key, &request_hash).await? {
            return Ok(ProvisionOutcome::Replayed(stored));
        }

        let idempotency = Some((key, request_hash.as_str()));
        match Self::provision_tx(pool, input, password_hash, actor_id, idempotency).await {
            Ok(result) => Ok(ProvisionOutcome::Created(result)),
            Err(err) if violates_any(&err, REPLAY_CONSTRAINTS) => {
                // The competing transaction has committed by the time the
                // unique index reports the violation.
                match Self::find_provisioned(pool, key, &request_hash).await? {
                    Some(stored) => {
                        tracing::info!(key, "Provisioning raced an in-flight request, replaying");
                        Ok(ProvisionOutcome::Replayed(stored))
                    }
                    None => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn provision_tx(
        pool: &PgPool,
        input: &BrandProvisioning,
        password_hash: &str,
        actor_id: DbId,
        idempotency: Option<(&str, &str)>,
    ) -> Result<ProvisionedBrand, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = UserRepo::insert(&mut tx, &input.manager_email, password_hash).await?;
        let profile =
            ProfileRepo::insert(&mut tx, user.id, &input.manager_name, ROLE_BRAND_MANAGER).await?;

        let query = format!(
            "INSERT INTO brands (name, industry, website)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let brand = sqlx::query_as::<_, Brand>(&query)
            .bind(&input.brand_name)
            .bind(&input.industry)
            .bind(&input.website)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO brand_members (brand_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(brand.id)
            .bind(user.id)
            .bind(ROLE_BRAND_MANAGER)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO brand_users (brand_id, user_id) VALUES ($1, $2)")
            .bind(brand.id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        let result = ProvisionedBrand {
            brand,
            manager: ProvisionedManager {
                id: user.id,
                email: user.email,
                display_name: profile.display_name,
                role: profile.role,
            },
        };

        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(
                Some(actor_id),
                actions::BRAND_PROVISIONED,
                entities::BRAND,
                result.brand.id,
            )
            .with_details(serde_json::json!({
                "manager_id": result.manager.id,
                "manager_email": result.manager.email,
                "brand_name": result.brand.name,
            })),
        )
        .await?;

        if let Some((key, request_hash)) = idempotency {
            let response =
                serde_json::to_value(&result).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            sqlx::query(
                "INSERT INTO idempotency_keys (scope, key, request_hash, response)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(PROVISION_SCOPE)
            .bind(key)
            .bind(request_hash)
            .bind(response)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            brand_id = %result.brand.id,
            manager_id = %result.manager.id,
            "Brand provisioned",
        );
        Ok(result)
    }
}

fn violates_any(err: &sqlx::Error, constraints: &[&str]) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.constraint())
        .is_some_and(|name| constraints.contains(&name))
}
