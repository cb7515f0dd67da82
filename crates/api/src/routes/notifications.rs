use axum::routing::get;
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /preferences       -> get
/// PUT    /preferences       -> put
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/preferences",
        get(notifications::get).put(notifications::put),
    )
}
