//! Brand account models, including the provisioning result.

use leaders_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `brands` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Brand {
    pub id: DbId,
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for updating a brand. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBrand {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
}

/// A row from the `brand_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BrandMember {
    pub brand_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub created_at: Timestamp,
}

/// The manager identity created during provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedManager {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

/// Everything created by one provisioning call.
///
/// Also the body stored against an idempotency key and replayed verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedBrand {
    pub brand: Brand,
    pub manager: ProvisionedManager,
}

/// Whether a provisioning call did the work or replayed a stored result.
#[derive(Debug, Clone)]
pub enum ProvisionOutcome {
    Created(ProvisionedBrand),
    Replayed(ProvisionedBrand),
}
