//! Payment model and DTOs.

use leaders_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub task_id: DbId,
    pub amount_cents: Cents,
    pub currency: String,
    pub status: String,
    pub proof_path: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /api/tasks/{id}/payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    pub amount_cents: Cents,
    pub currency: Option<String>,
}
