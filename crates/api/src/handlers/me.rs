//! Handlers for the caller's own profile (`/me`).

use axum::extract::State;
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_db::models::profile::{UpdateProfile, UserSummary};
use leaders_db::repositories::ProfileRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/me
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UserSummary>>> {
    let summary = ProfileRepo::find_summary(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::USER,
            id: auth.user_id,
        }))?;
    Ok(DataResponse::new(summary))
}

/// PUT /api/me
///
/// Only the display name is self-editable; roles change through admin
/// endpoints.
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<DataResponse<UserSummary>>> {
    let display_name = input.display_name.map(|n| n.trim().to_string());
    if let Some(name) = &display_name {
        if name.is_empty() || name.chars().count() > 120 {
            return Err(AppError::Core(CoreError::Validation(
                "display name must be 1-120 characters".into(),
            )));
        }
    }

    ProfileRepo::update(&state.pool, auth.user_id, &UpdateProfile { display_name }).await?;
    get_me(State(state), auth).await
}
