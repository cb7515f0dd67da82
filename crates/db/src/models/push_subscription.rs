//! Browser push subscription model.

use leaders_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `push_subscriptions` table.
///
/// `p256dh` and `auth` are the browser's base64url-encoded key material.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushSubscription {
    pub id: DbId,
    pub user_id: DbId,
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub p256dh: String,
    #[serde(skip_serializing)]
    pub auth: String,
    pub created_at: Timestamp,
}

/// Keys half of a browser `PushSubscription.toJSON()`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Body of `POST /api/push/subscriptions`, shaped like `PushSubscription.toJSON()`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}
