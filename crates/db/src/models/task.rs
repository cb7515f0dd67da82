//! Task model.

use leaders_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub campaign_id: DbId,
    pub creator_id: DbId,
    pub application_id: Option<DbId>,
    pub status: String,
    pub feedback: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Who may see a task: its creator and the campaign's brand.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct TaskOwner {
    pub task_id: DbId,
    pub creator_id: DbId,
    pub brand_id: DbId,
}
