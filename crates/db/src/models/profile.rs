//! Profile model and the joined user summary.

use leaders_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `profiles` table. `id` equals the owning user's id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: DbId,
    pub display_name: String,
    pub role: String,
    pub is_blocked: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Profile joined with the identity's email, safe for API responses.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub is_blocked: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Self-service profile patch for `PUT /api/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
}
