//! Web Push handlers: sending, subscription management and the VAPID
//! public key.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use leaders_core::error::CoreError;
use leaders_core::push::{may_send, validate_send_request, SendRequest};
use leaders_db::models::push_subscription::{PushSubscription, UpsertPushSubscription};
use leaders_db::repositories::PushSubscriptionRepo;
use leaders_events::DispatchReport;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::push::PushService;
use crate::rate_limit::enforce;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_ENDPOINT_CHARS: usize = 2048;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct VapidPublicKey {
    pub public_key: String,
}

fn push_service(state: &AppState) -> AppResult<&PushService> {
    state
        .push
        .as_deref()
        .ok_or_else(|| AppError::ServiceUnavailable("Push notifications are not configured".into()))
}

/// POST /api/push/send
///
/// Checks run in a fixed order: authentication, sender role, per-caller
/// rate limit, then payload validation. The body is parsed by hand so a
/// malformed payload cannot pre-empt the role and rate checks.
pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> AppResult<Json<DataResponse<DispatchReport>>> {
    if !may_send(&auth.role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Your role may not send push notifications".into(),
        )));
    }

    enforce(state.push_limiter.as_ref(), &format!("push:{}", auth.user_id)).await?;

    let request: SendRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let (recipient, message) = validate_send_request(&request)?;

    let service = push_service(&state)?;
    let report = service.dispatcher.dispatch(recipient, &message).await?;
    tracing::info!(
        sender_id = %auth.user_id,
        %recipient,
        sent = report.sent,
        removed = report.removed,
        failed = report.failed,
        "Push dispatched"
    );
    Ok(DataResponse::new(report))
}

/// POST /api/push/subscriptions
///
/// Registers or refreshes the caller's browser subscription. An endpoint
/// already registered to another user is moved to the caller.
pub async fn subscribe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpsertPushSubscription>,
) -> AppResult<(StatusCode, Json<DataResponse<PushSubscription>>)> {
    validate_endpoint(&input.endpoint)?;
    if input.keys.p256dh.trim().is_empty() || input.keys.auth.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "keys.p256dh and keys.auth are required".into(),
        )));
    }

    let subscription = PushSubscriptionRepo::upsert(&state.pool, auth.user_id, &input).await?;
    tracing::debug!(user_id = %auth.user_id, subscription_id = %subscription.id, "Push subscription saved");
    Ok((StatusCode::CREATED, DataResponse::new(subscription)))
}

/// DELETE /api/push/subscriptions
pub async fn unsubscribe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UnsubscribeRequest>,
) -> AppResult<StatusCode> {
    let removed =
        PushSubscriptionRepo::delete_for_user(&state.pool, auth.user_id, &input.endpoint).await?;
    if !removed {
        return Err(AppError::Database(sqlx::Error::RowNotFound));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/push/vapid-public-key
pub async fn vapid_public_key(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<VapidPublicKey>>> {
    let service = push_service(&state)?;
    Ok(DataResponse::new(VapidPublicKey {
        public_key: service.public_key.clone(),
    }))
}

fn validate_endpoint(endpoint: &str) -> Result<(), CoreError> {
    if !endpoint.starts_with("https://") || endpoint.len() > MAX_ENDPOINT_CHARS {
        return Err(CoreError::Validation(format!(
            "endpoint must be an https URL of at most {MAX_ENDPOINT_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_https() {
        assert!(validate_endpoint("https://fcm.googleapis.com/fcm/send/abc").is_ok());
        assert!(validate_endpoint("http://push.example.com/x").is_err());
        assert!(validate_endpoint("").is_err());
    }
}
