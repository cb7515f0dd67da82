//! Handlers for task disputes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::status::DisputeStatus;
use leaders_core::types::DbId;
use leaders_db::models::dispute::{CreateDispute, Dispute};
use leaders_db::models::visibility::Visibility;
use leaders_db::repositories::{DisputeRepo, WorkflowRepo};
use leaders_events::Audience;
use serde::Deserialize;

use crate::access::{load_task_owner, task_relation};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireDisputeResolver;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_REASON_CHARS: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct ResolveDispute {
    /// `under_review`, `resolved` or `rejected`.
    pub status: String,
    pub note: Option<String>,
}

async fn load_dispute(state: &AppState, id: DbId) -> AppResult<Dispute> {
    DisputeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::DISPUTE,
            id,
        }))
}

/// POST /api/tasks/{id}/disputes
///
/// Raised by the task's creator, a member of its brand, or staff. Moves
/// the task to `disputed`.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<DbId>,
    Json(input): Json<CreateDispute>,
) -> AppResult<(StatusCode, Json<DataResponse<Dispute>>)> {
    let (owner, _) = task_relation(&state.pool, &auth, task_id).await?;

    let reason = input.reason.trim();
    if reason.is_empty() || reason.chars().count() > MAX_REASON_CHARS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "reason must be 1-{MAX_REASON_CHARS} characters"
        ))));
    }

    let (dispute, changes) =
        WorkflowRepo::open_dispute(&state.pool, task_id, auth.user_id, reason).await?;
    state
        .event_bus
        .publish_changes(&changes, auth.user_id, Audience::from(&owner));
    tracing::info!(dispute_id = %dispute.id, %task_id, raised_by = %auth.user_id, "Dispute opened");
    Ok((StatusCode::CREATED, DataResponse::new(dispute)))
}

/// GET /api/disputes
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Dispute>>>> {
    let visibility = Visibility::for_role(&auth.role, auth.user_id);
    let disputes = DisputeRepo::list(&state.pool, visibility).await?;
    Ok(DataResponse::new(disputes))
}

/// POST /api/disputes/{id}/resolve
///
/// `resolved` returns the task to `approved`, `rejected` sends it back to
/// `needs_edits`.
pub async fn resolve(
    State(state): State<AppState>,
    RequireDisputeResolver(resolver): RequireDisputeResolver,
    Path(id): Path<DbId>,
    Json(input): Json<ResolveDispute>,
) -> AppResult<Json<DataResponse<Dispute>>> {
    let to = input.status.parse::<DisputeStatus>()?;
    let note = input
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if note.is_some_and(|n| n.chars().count() > MAX_REASON_CHARS) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "note must be at most {MAX_REASON_CHARS} characters"
        ))));
    }

    let dispute = load_dispute(&state, id).await?;
    let owner = load_task_owner(&state.pool, dispute.task_id).await?;
    let changes =
        WorkflowRepo::advance_dispute(&state.pool, &dispute, to, resolver.user_id, note).await?;
    state
        .event_bus
        .publish_changes(&changes, resolver.user_id, Audience::from(&owner));
    tracing::info!(dispute_id = %id, %to, resolver_id = %resolver.user_id, "Dispute advanced");

    let dispute = load_dispute(&state, id).await?;
    Ok(DataResponse::new(dispute))
}
