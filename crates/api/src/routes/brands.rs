use axum::routing::{get, post};
use axum::Router;

use crate::handlers::brands;
use crate::state::AppState;

/// Routes mounted at `/brands`.
///
/// ```text
/// GET    /              -> list
/// GET    /{id}          -> get
/// PUT    /{id}          -> update
/// POST   /{id}/verify   -> verify (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(brands::list))
        .route("/{id}", get(brands::get).put(brands::update))
        .route("/{id}/verify", post(brands::verify))
}
