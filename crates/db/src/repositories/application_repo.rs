//! Repository for the `applications` table.

use leaders_core::audit::{actions, entities};
use leaders_core::status::{ApplicationStatus, Transition};
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::application::{Application, CreateApplication};
use crate::models::audit::CreateAuditLog;
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, campaign_id, creator_id, pitch, bid_cents, status, created_at, updated_at";

pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Submit an application.
    ///
    /// A second application by the same creator to the same campaign fails
    /// on `uq_applications_campaign_creator`.
    pub async fn create(
        pool: &PgPool,
        campaign_id: DbId,
        creator_id: DbId,
        input: &CreateApplication,
    ) -> Result<Application, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO applications (campaign_id, creator_id, pitch, bid_cents, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let application = sqlx::query_as::<_, Application>(&query)
            .bind(campaign_id)
            .bind(creator_id)
            .bind(&input.pitch)
            .bind(input.bid_cents)
            .bind(ApplicationStatus::Submitted.as_str())
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(
                Some(creator_id),
                actions::ENTITY_CREATE,
                entities::APPLICATION,
                application.id,
            ),
        )
        .await?;
        tx.commit().await?;
        Ok(application)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications WHERE campaign_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_creator(
        pool: &PgPool,
        creator_id: DbId,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications WHERE creator_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(creator_id)
            .fetch_all(pool)
            .await
    }
}
