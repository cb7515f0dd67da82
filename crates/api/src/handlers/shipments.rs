//! Handlers for product shipment requests and shipments.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::status::{ShipmentRequestStatus, ShipmentStatus};
use leaders_core::types::DbId;
use leaders_db::models::shipment::{
    CreateShipmentRequest, Shipment, ShipmentRequest, ShipmentTracking,
};
use leaders_db::models::visibility::Visibility;
use leaders_db::repositories::{ShipmentRepo, WorkflowRepo};
use leaders_events::{Audience, ChangeEvent};
use serde::{Deserialize, Serialize};

use crate::access::{task_relation, TaskRelation};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_ADDRESS_CHARS: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct RequestDecision {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentUpdate {
    pub status: String,
    #[serde(flatten)]
    pub tracking: ShipmentTracking,
}

#[derive(Debug, Serialize)]
pub struct RequestDecisionResult {
    pub request: ShipmentRequest,
    /// Created when the request was approved.
    pub shipment: Option<Shipment>,
}

fn reviewer_only(relation: TaskRelation) -> AppResult<()> {
    if relation.is_reviewer() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the brand or staff may manage shipments".into(),
        )))
    }
}

/// POST /api/tasks/{id}/shipment-requests
pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<DbId>,
    Json(input): Json<CreateShipmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ShipmentRequest>>)> {
    let (owner, relation) = task_relation(&state.pool, &auth, task_id).await?;
    if relation != TaskRelation::Creator {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the task's creator may request a shipment".into(),
        )));
    }
    let address = input.address.trim();
    if address.is_empty() || address.chars().count() > MAX_ADDRESS_CHARS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "address must be 1-{MAX_ADDRESS_CHARS} characters"
        ))));
    }

    let request = ShipmentRepo::create_request(
        &state.pool,
        task_id,
        &CreateShipmentRequest {
            address: address.to_string(),
        },
        auth.user_id,
    )
    .await?;
    state.event_bus.publish(
        ChangeEvent::new("shipment_requests", request.id, "insert")
            .with_status(request.status.clone())
            .with_actor(auth.user_id)
            .with_audience(Audience::from(&owner)),
    );
    Ok((StatusCode::CREATED, DataResponse::new(request)))
}

/// GET /api/shipment-requests
pub async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ShipmentRequest>>>> {
    let visibility = Visibility::for_role(&auth.role, auth.user_id);
    let requests = ShipmentRepo::list_requests(&state.pool, visibility).await?;
    Ok(DataResponse::new(requests))
}

/// POST /api/shipment-requests/{id}/status
///
/// Approval creates the shipment in `preparing`.
pub async fn decide_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<RequestDecision>,
) -> AppResult<Json<DataResponse<RequestDecisionResult>>> {
    let to = input.status.parse::<ShipmentRequestStatus>()?;
    let request = ShipmentRepo::find_request(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::SHIPMENT_REQUEST,
            id,
        }))?;
    let (owner, relation) = task_relation(&state.pool, &auth, request.task_id).await?;
    reviewer_only(relation)?;

    let (changes, shipment) =
        WorkflowRepo::decide_shipment_request(&state.pool, &request, to, auth.user_id).await?;
    state
        .event_bus
        .publish_changes(&changes, auth.user_id, Audience::from(&owner));

    let request = ShipmentRepo::find_request(&state.pool, id)
        .await?
        .unwrap_or(request);
    Ok(DataResponse::new(RequestDecisionResult { request, shipment }))
}

/// GET /api/shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Shipment>>>> {
    let visibility = Visibility::for_role(&auth.role, auth.user_id);
    let shipments = ShipmentRepo::list_shipments(&state.pool, visibility).await?;
    Ok(DataResponse::new(shipments))
}

/// POST /api/shipments/{id}/status
///
/// Optionally records `carrier` and `tracking_number` alongside the move.
pub async fn update_shipment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ShipmentUpdate>,
) -> AppResult<Json<DataResponse<Shipment>>> {
    let to = input.status.parse::<ShipmentStatus>()?;
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: entities::SHIPMENT,
            id,
        })
    };
    let shipment = ShipmentRepo::find_shipment(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    let task_id = ShipmentRepo::task_id_of_shipment(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    let (owner, relation) = task_relation(&state.pool, &auth, task_id).await?;
    reviewer_only(relation)?;

    let changes = WorkflowRepo::update_shipment(
        &state.pool,
        &shipment,
        to,
        &input.tracking,
        auth.user_id,
    )
    .await?;
    state
        .event_bus
        .publish_changes(&changes, auth.user_id, Audience::from(&owner));
    tracing::info!(shipment_id = %id, %to, "Shipment status changed");

    let shipment = ShipmentRepo::find_shipment(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(DataResponse::new(shipment))
}
