//! Notification channel preference model.

use leaders_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub user_id: DbId,
    pub channels: Vec<String>,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    pub fn allows(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

/// Body of `PUT /api/notifications/preferences`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNotificationPreference {
    pub channels: Vec<String>,
}
