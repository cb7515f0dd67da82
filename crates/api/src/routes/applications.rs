use axum::routing::{get, post};
use axum::Router;

use crate::handlers::applications;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// GET    /mine              -> mine
/// POST   /{id}/status       -> decide
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(applications::mine))
        .route("/{id}/status", post(applications::decide))
}
