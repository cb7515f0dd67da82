//! Repository for the `users` table.

use leaders_core::audit::{actions, entities};
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::CreateAuditLog;
use crate::models::profile::Profile;
use crate::models::user::{CreateAccount, User};
use crate::repositories::{AuditLogRepo, ProfileRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, last_login_at, created_at";

/// Provides lookups and account creation for identities.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email. Emails are stored lower-cased.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Insert an identity inside an open transaction.
    pub async fn insert(
        conn: &mut sqlx::PgConnection,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(conn)
            .await
    }

    /// Create an identity and its profile in one transaction.
    ///
    /// A duplicate email fails on `uq_users_email` and leaves nothing behind.
    pub async fn create_account(
        pool: &PgPool,
        input: &CreateAccount,
    ) -> Result<(User, Profile), sqlx::Error> {
        let mut tx = pool.begin().await?;
        let user = Self::insert(&mut tx, &input.email, &input.password_hash).await?;
        let profile =
            ProfileRepo::insert(&mut tx, user.id, &input.display_name, &input.role).await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(Some(user.id), actions::ENTITY_CREATE, entities::USER, user.id)
                .with_details(serde_json::json!({ "role": input.role })),
        )
        .await?;
        tx.commit().await?;
        Ok((user, profile))
    }

    /// Stamp `last_login_at` after a successful login.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
