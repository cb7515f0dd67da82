//! Handlers for creator applications.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::status::{ApplicationStatus, CampaignStatus, Transition};
use leaders_core::types::DbId;
use leaders_db::models::application::{Application, CreateApplication};
use leaders_db::models::task::Task;
use leaders_db::repositories::{ApplicationRepo, WorkflowRepo};
use leaders_events::{Audience, ChangeEvent};
use serde::{Deserialize, Serialize};

use crate::access::{ensure_brand_access, load_campaign};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireCreator;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_PITCH_CHARS: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct ApplicationDecision {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DecisionResult {
    pub application: Application,
    /// The creator's new task when the application was approved.
    pub task: Option<Task>,
}

/// POST /api/campaigns/{id}/applications
///
/// Creators apply to `open` campaigns; one application per campaign.
pub async fn create(
    State(state): State<AppState>,
    RequireCreator(creator): RequireCreator,
    Path(campaign_id): Path<DbId>,
    Json(input): Json<CreateApplication>,
) -> AppResult<(StatusCode, Json<DataResponse<Application>>)> {
    let campaign = load_campaign(&state.pool, campaign_id).await?;
    if campaign.status != CampaignStatus::Open.as_str() {
        return Err(AppError::Core(CoreError::Conflict(
            "Campaign is not accepting applications".into(),
        )));
    }
    if input.pitch.chars().count() > MAX_PITCH_CHARS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "pitch must be at most {MAX_PITCH_CHARS} characters"
        ))));
    }
    if input.bid_cents.is_some_and(|b| b < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "bid_cents must not be negative".into(),
        )));
    }

    let application =
        ApplicationRepo::create(&state.pool, campaign_id, creator.user_id, &input).await?;
    state.event_bus.publish(
        ChangeEvent::new("applications", application.id, "insert")
            .with_status(application.status.clone())
            .with_actor(creator.user_id)
            .with_audience(Audience::brand(campaign.brand_id).with_creator(creator.user_id)),
    );
    Ok((StatusCode::CREATED, DataResponse::new(application)))
}

/// GET /api/campaigns/{id}/applications
pub async fn list_for_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Application>>>> {
    let campaign = load_campaign(&state.pool, campaign_id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;
    let applications = ApplicationRepo::list_for_campaign(&state.pool, campaign_id).await?;
    Ok(DataResponse::new(applications))
}

/// GET /api/applications/mine
pub async fn mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Application>>>> {
    let applications = ApplicationRepo::list_for_creator(&state.pool, auth.user_id).await?;
    Ok(DataResponse::new(applications))
}

/// POST /api/applications/{id}/status
///
/// Approving creates the creator's task in `selected` atomically.
pub async fn decide(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ApplicationDecision>,
) -> AppResult<Json<DataResponse<DecisionResult>>> {
    let to = input.status.parse::<ApplicationStatus>()?;
    let application = ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::APPLICATION,
            id,
        }))?;
    let campaign = load_campaign(&state.pool, application.campaign_id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;

    let (changes, task) =
        WorkflowRepo::decide_application(&state.pool, &application, to, auth.user_id).await?;
    state.event_bus.publish_changes(
        &changes,
        auth.user_id,
        Audience::brand(campaign.brand_id).with_creator(application.creator_id),
    );
    tracing::info!(application_id = %id, %to, "Application decided");

    let application = ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .unwrap_or(application);
    Ok(DataResponse::new(DecisionResult { application, task }))
}
