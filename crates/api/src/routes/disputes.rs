use axum::routing::{get, post};
use axum::Router;

use crate::handlers::disputes;
use crate::state::AppState;

/// Routes mounted at `/disputes`.
///
/// ```text
/// GET    /                  -> list
/// POST   /{id}/resolve      -> resolve (admin, support)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(disputes::list))
        .route("/{id}/resolve", post(disputes::resolve))
}
