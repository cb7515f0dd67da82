use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// GET    /                  -> list
/// POST   /{id}/status       -> set_status (finance)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(payments::list))
        .route("/{id}/status", post(payments::set_status))
}
