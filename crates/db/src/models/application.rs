//! Creator application model and DTOs.

use leaders_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub campaign_id: DbId,
    pub creator_id: DbId,
    pub pitch: String,
    pub bid_cents: Option<Cents>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /api/campaigns/{id}/applications`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplication {
    #[serde(default)]
    pub pitch: String,
    pub bid_cents: Option<Cents>,
}
