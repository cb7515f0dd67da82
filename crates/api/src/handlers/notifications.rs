//! Handlers for the caller's notification channel preferences.

use axum::extract::State;
use axum::Json;
use leaders_core::channels::{validate_channels, DEFAULT_CHANNELS};
use leaders_core::error::CoreError;
use leaders_db::models::notification::UpdateNotificationPreference;
use leaders_db::repositories::NotificationPreferenceRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Preferences {
    pub channels: Vec<String>,
    /// False when no row exists and the defaults are reported.
    pub customized: bool,
}

/// GET /api/notifications/preferences
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Preferences>>> {
    let preferences = match NotificationPreferenceRepo::find(&state.pool, auth.user_id).await? {
        Some(row) => Preferences {
            channels: row.channels,
            customized: true,
        },
        None => Preferences {
            channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            customized: false,
        },
    };
    Ok(DataResponse::new(preferences))
}

/// PUT /api/notifications/preferences
pub async fn put(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<UpdateNotificationPreference>,
) -> AppResult<Json<DataResponse<Preferences>>> {
    validate_channels(&input.channels).map_err(CoreError::Validation)?;
    input.channels.sort();
    input.channels.dedup();

    let row = NotificationPreferenceRepo::upsert(&state.pool, auth.user_id, &input.channels).await?;
    tracing::debug!(user_id = %auth.user_id, channels = ?row.channels, "Notification preferences updated");
    Ok(DataResponse::new(Preferences {
        channels: row.channels,
        customized: true,
    }))
}
