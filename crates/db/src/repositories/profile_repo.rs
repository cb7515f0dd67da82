//! Repository for the `profiles` table.

use leaders_core::audit::{actions, entities};
use leaders_core::error::CoreError;
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::audit::CreateAuditLog;
use crate::models::profile::{Profile, UpdateProfile, UserSummary};
use crate::repositories::{AuditLogRepo, SessionRepo};

const COLUMNS: &str = "id, display_name, role, is_blocked, created_at, updated_at";

/// Profile joined with its identity, aliased `p` and `u`.
const SUMMARY_SELECT: &str = "SELECT u.id, u.email, p.display_name, p.role, p.is_blocked, \
                              u.last_login_at, u.created_at \
                              FROM users u JOIN profiles p ON p.id = u.id";

pub struct ProfileRepo;

impl ProfileRepo {
    /// Insert a profile inside an open transaction.
    pub async fn insert(
        conn: &mut sqlx::PgConnection,
        user_id: DbId,
        display_name: &str,
        role: &str,
    ) -> Result<Profile, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (id, display_name, role)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(display_name)
            .bind(role)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_summary(pool: &PgPool, id: DbId) -> Result<Option<UserSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE u.id = $1");
        sqlx::query_as::<_, UserSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List users, optionally filtered by role, newest first.
    pub async fn list_summaries(
        pool: &PgPool,
        role: Option<&str>,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE ($1::text IS NULL OR p.role = $1) ORDER BY u.created_at DESC"
        );
        sqlx::query_as::<_, UserSummary>(&query)
            .bind(role)
            .fetch_all(pool)
            .await
    }

    /// Apply a self-service patch. Returns `None` if the profile is missing.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles SET display_name = COALESCE($2, display_name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .bind(&input.display_name)
            .fetch_optional(pool)
            .await
    }

    /// Block or unblock a user.
    ///
    /// Blocking also revokes every live session so refresh tokens stop
    /// working immediately. Returns `None` if the profile is missing.
    pub async fn set_blocked(
        pool: &PgPool,
        id: DbId,
        blocked: bool,
        actor_id: DbId,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE profiles SET is_blocked = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let Some(profile) = sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .bind(blocked)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if blocked {
            SessionRepo::revoke_all_for_user(&mut *tx, id).await?;
        }

        let action = if blocked {
            actions::USER_BLOCKED
        } else {
            actions::USER_UNBLOCKED
        };
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(Some(actor_id), action, entities::USER, id),
        )
        .await?;
        tx.commit().await?;
        Ok(Some(profile))
    }

    /// Grant `role` to every user in `user_ids` atomically.
    ///
    /// Fails with [`CoreError::NotFound`] (and changes nothing) if any id
    /// has no profile. Writes one audit row per grant, recording the
    /// previous role.
    pub async fn grant_role(
        pool: &PgPool,
        user_ids: &[DbId],
        role: &str,
        actor_id: DbId,
    ) -> Result<Vec<Profile>, DbError> {
        let mut tx = pool.begin().await?;

        let current: Vec<(DbId, String)> =
            sqlx::query_as("SELECT id, role FROM profiles WHERE id = ANY($1) FOR UPDATE")
                .bind(user_ids)
                .fetch_all(&mut *tx)
                .await?;

        if let Some(missing) = user_ids
            .iter()
            .find(|id| !current.iter().any(|(found, _)| found == *id))
        {
            return Err(CoreError::NotFound {
                entity: entities::USER,
                id: *missing,
            }
            .into());
        }

        let query = format!(
            "UPDATE profiles SET role = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let mut granted = Vec::with_capacity(current.len());
        for (id, previous) in current {
            let profile = sqlx::query_as::<_, Profile>(&query)
                .bind(id)
                .bind(role)
                .fetch_one(&mut *tx)
                .await?;
            AuditLogRepo::insert(
                &mut *tx,
                &CreateAuditLog::new(Some(actor_id), actions::ROLE_GRANTED, entities::USER, id)
                    .with_details(serde_json::json!({ "from": previous, "to": role })),
            )
            .await?;
            granted.push(profile);
        }

        tx.commit().await?;
        Ok(granted)
    }
}
