//! Repository for the `campaigns` table.

use leaders_core::audit::{actions, entities};
use leaders_core::status::{CampaignStatus, Transition};
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::CreateAuditLog;
use crate::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, brand_id, title, description, status, fixed_price_cents, currency, \
                       deadline, created_by, created_at, updated_at";

pub struct CampaignRepo;

impl CampaignRepo {
    /// Insert a campaign in `draft`, with its audit row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCampaign,
        actor_id: DbId,
    ) -> Result<Campaign, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO campaigns
                (brand_id, title, description, status, fixed_price_cents, currency, deadline, created_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'USD'), $7, $8)
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(input.brand_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(CampaignStatus::Draft.as_str())
            .bind(input.fixed_price_cents)
            .bind(&input.currency)
            .bind(input.deadline)
            .bind(actor_id)
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(
                Some(actor_id),
                actions::ENTITY_CREATE,
                entities::CAMPAIGN,
                campaign.id,
            ),
        )
        .await?;
        tx.commit().await?;
        Ok(campaign)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All campaigns, optionally filtered by status, newest first.
    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Campaigns of every brand the user is a member of.
    pub async fn list_for_member(
        pool: &PgPool,
        user_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns
             WHERE brand_id IN (SELECT brand_id FROM brand_members WHERE user_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(user_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Update a campaign. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCampaign,
        actor_id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE campaigns SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                fixed_price_cents = COALESCE($4, fixed_price_cents),
                currency = COALESCE($5, currency),
                deadline = COALESCE($6, deadline)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.fixed_price_cents)
            .bind(&input.currency)
            .bind(input.deadline)
            .fetch_optional(&mut *tx)
            .await?;
        if campaign.is_some() {
            AuditLogRepo::insert(
                &mut *tx,
                &CreateAuditLog::new(Some(actor_id), actions::ENTITY_UPDATE, entities::CAMPAIGN, id),
            )
            .await?;
        }
        tx.commit().await?;
        Ok(campaign)
    }
}
