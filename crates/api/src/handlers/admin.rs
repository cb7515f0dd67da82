//! Admin-only handlers: brand provisioning, role grants, user blocking,
//! and the audit log.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::provisioning::{validate_idempotency_key, CreateBrandRequest};
use leaders_core::roles::{self, ROLE_ADMIN};
use leaders_core::types::DbId;
use leaders_db::models::audit::{AuditLog, AuditQuery};
use leaders_db::models::brand::{ProvisionOutcome, ProvisionedBrand};
use leaders_db::models::profile::{Profile, UserSummary};
use leaders_db::repositories::{AuditLogRepo, BrandRepo, ProfileRepo};
use leaders_events::{Audience, ChangeEvent};
use serde::{Deserialize, Serialize};

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the caller's idempotency token for provisioning.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Upper bound on ids per `set-admins` call.
const MAX_GRANT_BATCH: usize = 100;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SetAdminsRequest {
    pub user_ids: Vec<DbId>,
    /// Staff role to grant; defaults to `admin`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/admin/create-brand
///
/// Provisions the manager identity, profile, brand and both membership
/// rows in one transaction. With an `Idempotency-Key` header a repeated
/// call returns the original result with 200 instead of 201.
pub async fn create_brand(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    headers: HeaderMap,
    Json(input): Json<CreateBrandRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProvisionedBrand>>)> {
    let idempotency_key = match headers.get(IDEMPOTENCY_KEY_HEADER) {
        Some(value) => {
            let key = value.to_str().map_err(|_| {
                AppError::Core(CoreError::Validation(
                    "Idempotency-Key must be printable ASCII".into(),
                ))
            })?;
            validate_idempotency_key(key)?;
            Some(key.to_string())
        }
        None => None,
    };

    let provisioning = input.into_provisioning()?;
    let password_hash = hash_password(&provisioning.manager_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let outcome = BrandRepo::provision(
        &state.pool,
        &provisioning,
        &password_hash,
        admin.user_id,
        idempotency_key.as_deref(),
    )
    .await?;

    match outcome {
        ProvisionOutcome::Created(result) => {
            tracing::info!(
                brand_id = %result.brand.id,
                manager_id = %result.manager.id,
                admin_id = %admin.user_id,
                "Brand provisioned"
            );
            state.event_bus.publish(
                ChangeEvent::new("brands", result.brand.id, "insert")
                    .with_actor(admin.user_id)
                    .with_audience(Audience::brand(result.brand.id)),
            );
            Ok((StatusCode::CREATED, DataResponse::new(result)))
        }
        ProvisionOutcome::Replayed(result) => {
            tracing::info!(brand_id = %result.brand.id, "Brand provisioning replayed");
            Ok((StatusCode::OK, DataResponse::new(result)))
        }
    }
}

/// POST /api/admin/set-admins
///
/// Grant a staff role to a batch of users atomically. Unknown ids fail
/// the whole batch with 404.
pub async fn set_admins(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<SetAdminsRequest>,
) -> AppResult<Json<DataResponse<Vec<Profile>>>> {
    let role = input.role.as_deref().unwrap_or(ROLE_ADMIN);
    if !roles::is_staff(role) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "'{role}' is not a staff role"
        ))));
    }

    let mut user_ids = input.user_ids;
    user_ids.sort();
    user_ids.dedup();
    if user_ids.is_empty() || user_ids.len() > MAX_GRANT_BATCH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "user_ids must contain 1-{MAX_GRANT_BATCH} ids"
        ))));
    }

    let granted = ProfileRepo::grant_role(&state.pool, &user_ids, role, admin.user_id).await?;
    tracing::info!(count = granted.len(), role, admin_id = %admin.user_id, "Role granted");
    Ok(DataResponse::new(granted))
}

/// GET /api/admin/users?role=
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<DataResponse<Vec<UserSummary>>>> {
    let users = ProfileRepo::list_summaries(&state.pool, params.role.as_deref()).await?;
    Ok(DataResponse::new(users))
}

/// POST /api/admin/users/{id}/block
pub async fn block_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Profile>>> {
    if id == admin.user_id {
        return Err(AppError::BadRequest("Cannot block your own account".into()));
    }
    set_blocked(&state, id, true, admin.user_id).await
}

/// POST /api/admin/users/{id}/unblock
pub async fn unblock_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Profile>>> {
    set_blocked(&state, id, false, admin.user_id).await
}

/// GET /api/admin/audit-logs
pub async fn audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<AuditPage>>> {
    let items = AuditLogRepo::query(&state.pool, &params).await?;
    let total = AuditLogRepo::count(&state.pool, &params).await?;
    Ok(DataResponse::new(AuditPage { items, total }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn set_blocked(
    state: &AppState,
    id: DbId,
    blocked: bool,
    actor_id: DbId,
) -> AppResult<Json<DataResponse<Profile>>> {
    let profile = ProfileRepo::set_blocked(&state.pool, id, blocked, actor_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::USER,
            id,
        }))?;
    tracing::info!(user_id = %id, blocked, admin_id = %actor_id, "User block state changed");
    Ok(DataResponse::new(profile))
}
