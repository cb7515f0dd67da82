//! Handlers for creator payouts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::status::{PaymentStatus, TaskStatus, Transition};
use leaders_core::types::DbId;
use leaders_db::models::payment::{CreatePayment, Payment};
use leaders_db::models::visibility::Visibility;
use leaders_db::repositories::{PaymentRepo, WorkflowRepo};
use leaders_events::{Audience, ChangeEvent};
use serde::Deserialize;

use crate::access::{load_task, load_task_owner};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireFinance;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    pub status: String,
}

async fn load_payment(state: &AppState, id: DbId) -> AppResult<Payment> {
    PaymentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::PAYMENT,
            id,
        }))
}

/// GET /api/payments
///
/// Scoped by role: staff see all, brand users their brands', creators
/// their own.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    let visibility = Visibility::for_role(&auth.role, auth.user_id);
    let payments = PaymentRepo::list(&state.pool, visibility).await?;
    Ok(DataResponse::new(payments))
}

/// POST /api/tasks/{id}/payments
///
/// Finance records a `pending` payout for an approved task.
pub async fn create(
    State(state): State<AppState>,
    RequireFinance(user): RequireFinance,
    Path(task_id): Path<DbId>,
    Json(input): Json<CreatePayment>,
) -> AppResult<(StatusCode, Json<DataResponse<Payment>>)> {
    if input.amount_cents <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "amount_cents must be positive".into(),
        )));
    }
    let task = load_task(&state.pool, task_id).await?;
    if task.status != TaskStatus::Approved.as_str() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Payments can only be created for approved tasks (task is '{}')",
            task.status
        ))));
    }

    let owner = load_task_owner(&state.pool, task_id).await?;
    let payment = PaymentRepo::create(&state.pool, task_id, &input, user.user_id).await?;
    tracing::info!(payment_id = %payment.id, %task_id, amount_cents = payment.amount_cents, "Payment created");
    state.event_bus.publish(
        ChangeEvent::new("payments", payment.id, "insert")
            .with_status(payment.status.clone())
            .with_actor(user.user_id)
            .with_audience(Audience::from(&owner)),
    );
    Ok((StatusCode::CREATED, DataResponse::new(payment)))
}

/// POST /api/payments/{id}/status
///
/// Marking a payment `paid` also moves its task to `paid`.
pub async fn set_status(
    State(state): State<AppState>,
    RequireFinance(user): RequireFinance,
    Path(id): Path<DbId>,
    Json(input): Json<PaymentStatusRequest>,
) -> AppResult<Json<DataResponse<Payment>>> {
    let to = input.status.parse::<PaymentStatus>()?;
    let payment = load_payment(&state, id).await?;

    let owner = load_task_owner(&state.pool, payment.task_id).await?;

    let changes = WorkflowRepo::set_payment_status(&state.pool, &payment, to, user.user_id).await?;
    state
        .event_bus
        .publish_changes(&changes, user.user_id, Audience::from(&owner));
    tracing::info!(payment_id = %id, %to, "Payment status changed");

    let payment = load_payment(&state, id).await?;
    Ok(DataResponse::new(payment))
}
