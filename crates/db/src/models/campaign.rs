//! Campaign model and DTOs.

use leaders_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub brand_id: DbId,
    pub title: String,
    pub description: String,
    pub status: String,
    pub fixed_price_cents: Cents,
    pub currency: String,
    pub deadline: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a campaign. New campaigns always start in `draft`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub brand_id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub fixed_price_cents: Cents,
    pub currency: Option<String>,
    pub deadline: Option<Timestamp>,
}

/// DTO for updating a campaign. Status is changed through the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCampaign {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fixed_price_cents: Option<Cents>,
    pub currency: Option<String>,
    pub deadline: Option<Timestamp>,
}
