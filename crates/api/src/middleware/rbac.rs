//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects callers whose role is not
//! in the allowed set with 403. Resource-level checks (brand membership,
//! task ownership) live in [`crate::access`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use leaders_core::error::CoreError;
use leaders_core::roles::{
    DISPUTE_RESOLVER_ROLES, FINANCE_ROLES, ROLE_ADMIN, ROLE_CREATOR, STAFF_ROLES,
};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !user.has_any_role(allowed) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Requires the `admin` role.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, &[ROLE_ADMIN], "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires any internal staff role (`admin`, `finance`, `support`, `content_ops`).
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, STAFF_ROLES, "Staff role required")
            .await
            .map(RequireStaff)
    }
}

/// Requires `admin` or `finance`.
pub struct RequireFinance(pub AuthUser);

impl FromRequestParts<AppState> for RequireFinance {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, FINANCE_ROLES, "Finance role required")
            .await
            .map(RequireFinance)
    }
}

/// Requires `admin` or `support`.
pub struct RequireDisputeResolver(pub AuthUser);

impl FromRequestParts<AppState> for RequireDisputeResolver {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(
            parts,
            state,
            DISPUTE_RESOLVER_ROLES,
            "Admin or support role required",
        )
        .await
        .map(RequireDisputeResolver)
    }
}

/// Requires the `creator` role.
pub struct RequireCreator(pub AuthUser);

impl FromRequestParts<AppState> for RequireCreator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, &[ROLE_CREATOR], "Creator role required")
            .await
            .map(RequireCreator)
    }
}
