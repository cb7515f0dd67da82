//! Handlers for the `/campaigns` resource, including status changes and
//! the kanban views over tasks and applications.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use leaders_core::error::CoreError;
use leaders_core::kanban::{group_by_status, KanbanColumn};
use leaders_core::status::{parse_stored, ApplicationStatus, CampaignStatus, TaskStatus, Transition};
use leaders_core::types::DbId;
use leaders_db::models::application::Application;
use leaders_db::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use leaders_db::models::task::Task;
use leaders_db::repositories::{
    ApplicationRepo, CampaignRepo, StatusChange, TaskRepo, WorkflowRepo,
};
use leaders_events::{Audience, ChangeEvent};
use serde::{Deserialize, Serialize};

use crate::access::{ensure_brand_access, ensure_campaign_readable, load_campaign};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CampaignListParams {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignStatusRequest {
    pub status: String,
}

/// Fixed status buckets in declaration order, every bucket present.
#[derive(Debug, Serialize)]
pub struct KanbanBoard<T: Serialize> {
    pub columns: Vec<KanbanColumn<T>>,
    /// Rows whose stored status matched no bucket.
    pub unknown: usize,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_title(title: &str) -> Result<(), CoreError> {
    let len = title.trim().chars().count();
    if len == 0 || len > 200 {
        return Err(CoreError::Validation("title must be 1-200 characters".into()));
    }
    Ok(())
}

fn validate_price(cents: i64) -> Result<(), CoreError> {
    if cents < 0 {
        return Err(CoreError::Validation(
            "fixed_price_cents must not be negative".into(),
        ));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> Result<(), CoreError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(CoreError::Validation(
            "currency must be a three-letter ISO code".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/campaigns?status=
///
/// Staff see every campaign, brand users their brands' campaigns, and
/// creators only `open` ones.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<CampaignListParams>,
) -> AppResult<Json<DataResponse<Vec<Campaign>>>> {
    if let Some(status) = &params.status {
        status.parse::<CampaignStatus>()?;
    }

    let campaigns = if auth.is_staff() {
        CampaignRepo::list(&state.pool, params.status.as_deref()).await?
    } else if auth.is_brand() {
        CampaignRepo::list_for_member(&state.pool, auth.user_id, params.status.as_deref()).await?
    } else {
        CampaignRepo::list(&state.pool, Some(CampaignStatus::Open.as_str())).await?
    };
    Ok(DataResponse::new(campaigns))
}

/// POST /api/campaigns
///
/// New campaigns start in `draft`.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<DataResponse<Campaign>>)> {
    ensure_brand_access(&state.pool, &auth, input.brand_id).await?;

    input.title = input.title.trim().to_string();
    validate_title(&input.title)?;
    validate_price(input.fixed_price_cents)?;
    if let Some(currency) = &input.currency {
        validate_currency(currency)?;
    }

    let campaign = CampaignRepo::create(&state.pool, &input, auth.user_id).await?;
    tracing::info!(campaign_id = %campaign.id, brand_id = %campaign.brand_id, "Campaign created");
    state.event_bus.publish(
        ChangeEvent::new("campaigns", campaign.id, "insert")
            .with_status(campaign.status.clone())
            .with_actor(auth.user_id)
            .with_audience(Audience::brand(campaign.brand_id)),
    );
    Ok((StatusCode::CREATED, DataResponse::new(campaign)))
}

/// GET /api/campaigns/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = load_campaign(&state.pool, id).await?;
    ensure_campaign_readable(&state.pool, &auth, &campaign).await?;
    Ok(DataResponse::new(campaign))
}

/// PUT /api/campaigns/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCampaign>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = load_campaign(&state.pool, id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;

    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(cents) = input.fixed_price_cents {
        validate_price(cents)?;
    }
    if let Some(currency) = &input.currency {
        validate_currency(currency)?;
    }

    let updated = CampaignRepo::update(&state.pool, id, &input, auth.user_id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Campaign {id} vanished during update")))?;
    state.event_bus.publish(
        ChangeEvent::new("campaigns", id, "update")
            .with_actor(auth.user_id)
            .with_audience(Audience::brand(campaign.brand_id)),
    );
    Ok(DataResponse::new(updated))
}

/// POST /api/campaigns/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CampaignStatusRequest>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let to = input.status.parse::<CampaignStatus>()?;
    let campaign = load_campaign(&state.pool, id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;

    let from = parse_stored::<CampaignStatus>(&campaign.status)?;
    let changes =
        WorkflowRepo::transition(&state.pool, &StatusChange::new(id, from, to, auth.user_id))
            .await?;
    state
        .event_bus
        .publish_changes(&changes, auth.user_id, Audience::brand(campaign.brand_id));
    tracing::info!(campaign_id = %id, %from, %to, "Campaign status changed");

    let campaign = load_campaign(&state.pool, id).await?;
    Ok(DataResponse::new(campaign))
}

/// GET /api/campaigns/{id}/kanban/tasks
pub async fn task_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<KanbanBoard<Task>>>> {
    let campaign = load_campaign(&state.pool, id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;

    let tasks = TaskRepo::list_for_campaign(&state.pool, id).await?;
    let (columns, unknown) = group_by_status::<TaskStatus, _, _>(tasks, |t| t.status.as_str());
    if unknown > 0 {
        tracing::warn!(campaign_id = %id, unknown, "Tasks with unrecognised status");
    }
    Ok(DataResponse::new(KanbanBoard { columns, unknown }))
}

/// GET /api/campaigns/{id}/kanban/applications
pub async fn application_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<KanbanBoard<Application>>>> {
    let campaign = load_campaign(&state.pool, id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;

    let applications = ApplicationRepo::list_for_campaign(&state.pool, id).await?;
    let (columns, unknown) =
        group_by_status::<ApplicationStatus, _, _>(applications, |a| a.status.as_str());
    if unknown > 0 {
        tracing::warn!(campaign_id = %id, unknown, "Applications with unrecognised status");
    }
    Ok(DataResponse::new(KanbanBoard { columns, unknown }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_must_be_iso_code() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("EURO").is_err());
    }

    #[test]
    fn blank_title_and_negative_price_are_rejected() {
        assert!(validate_title("   ").is_err());
        assert!(validate_title("Summer launch").is_ok());
        assert!(validate_price(-1).is_err());
        assert!(validate_price(0).is_ok());
    }
}
