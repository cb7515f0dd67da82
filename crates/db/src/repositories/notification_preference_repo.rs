//! Repository for the `notification_preferences` table.

use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::NotificationPreference;

const COLUMNS: &str = "user_id, channels, updated_at";

pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    /// The user's preference row, if one was ever saved.
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationPreference>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_preferences WHERE user_id = $1");
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the user's channel list.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        channels: &[String],
    ) -> Result<NotificationPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences (user_id, channels)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET channels = EXCLUDED.channels
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .bind(channels)
            .fetch_one(pool)
            .await
    }
}
