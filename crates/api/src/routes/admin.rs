//! Route definitions for `/admin`. Every handler requires the `admin` role.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /create-brand              -> create_brand
/// POST   /set-admins                -> set_admins
/// GET    /users                     -> list_users
/// POST   /users/{id}/block          -> block_user
/// POST   /users/{id}/unblock        -> unblock_user
/// GET    /audit-logs                -> audit_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-brand", post(admin::create_brand))
        .route("/set-admins", post(admin::set_admins))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/block", post(admin::block_user))
        .route("/users/{id}/unblock", post(admin::unblock_user))
        .route("/audit-logs", get(admin::audit_logs))
}
