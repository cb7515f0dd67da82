//! Handlers for the `/brands` resource.

use axum::extract::{Path, State};
use axum::Json;
use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::roles::ROLE_BRAND_MANAGER;
use leaders_core::types::DbId;
use leaders_db::models::brand::{Brand, BrandMember, UpdateBrand};
use leaders_db::repositories::BrandRepo;
use leaders_events::{Audience, ChangeEvent};
use serde::Serialize;

use crate::access::ensure_brand_access;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BrandDetail {
    #[serde(flatten)]
    pub brand: Brand,
    pub members: Vec<BrandMember>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: entities::BRAND,
        id,
    })
}

/// GET /api/brands
///
/// Brand-side users see only their own brands.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Brand>>>> {
    let brands = if auth.is_brand() {
        BrandRepo::list_for_member(&state.pool, auth.user_id).await?
    } else {
        BrandRepo::list(&state.pool).await?
    };
    Ok(DataResponse::new(brands))
}

/// GET /api/brands/{id}
///
/// Members are included for staff and the brand's own users.
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BrandDetail>>> {
    let brand = BrandRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let members = if auth.is_creator() {
        Vec::new()
    } else {
        ensure_brand_access(&state.pool, &auth, id).await?;
        BrandRepo::list_members(&state.pool, id).await?
    };
    Ok(DataResponse::new(BrandDetail { brand, members }))
}

/// PUT /api/brands/{id}
///
/// Admins, or the brand's own managers.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBrand>,
) -> AppResult<Json<DataResponse<Brand>>> {
    if !auth.is_staff() {
        if auth.role != ROLE_BRAND_MANAGER {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only brand managers may edit a brand".into(),
            )));
        }
        ensure_brand_access(&state.pool, &auth, id).await?;
    }

    if let Some(name) = &input.name {
        let len = name.trim().chars().count();
        if len == 0 || len > 120 {
            return Err(AppError::Core(CoreError::Validation(
                "brand name must be 1-120 characters".into(),
            )));
        }
    }
    if let Some(website) = input.website.as_deref().filter(|w| !w.is_empty()) {
        if !(website.starts_with("https://") || website.starts_with("http://")) {
            return Err(AppError::Core(CoreError::Validation(
                "website must use http or https".into(),
            )));
        }
    }

    let brand = BrandRepo::update(&state.pool, id, &input, auth.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.event_bus.publish(
        ChangeEvent::new("brands", id, "update")
            .with_actor(auth.user_id)
            .with_audience(Audience::brand(id)),
    );
    Ok(DataResponse::new(brand))
}

/// POST /api/brands/{id}/verify
pub async fn verify(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Brand>>> {
    let brand = BrandRepo::verify(&state.pool, id, admin.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(brand_id = %id, admin_id = %admin.user_id, "Brand verified");
    state.event_bus.publish(
        ChangeEvent::new("brands", id, "update")
            .with_actor(admin.user_id)
            .with_audience(Audience::brand(id)),
    );
    Ok(DataResponse::new(brand))
}
