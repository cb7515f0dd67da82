//! Dispute model and DTOs.

use leaders_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `disputes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dispute {
    pub id: DbId,
    pub task_id: DbId,
    pub raised_by: DbId,
    pub reason: String,
    pub status: String,
    pub resolution_note: Option<String>,
    pub resolved_by: Option<DbId>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /api/tasks/{id}/disputes`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDispute {
    pub reason: String,
}
