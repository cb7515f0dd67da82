use axum::routing::{get, post};
use axum::Router;

use crate::handlers::shipments;
use crate::state::AppState;

/// Routes mounted at `/shipment-requests`.
///
/// ```text
/// GET    /                  -> list_requests
/// POST   /{id}/status       -> decide_request
/// ```
pub fn requests_router() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::list_requests))
        .route("/{id}/status", post(shipments::decide_request))
}

/// Routes mounted at `/shipments`.
///
/// ```text
/// GET    /                  -> list_shipments
/// POST   /{id}/status       -> update_shipment
/// ```
pub fn shipments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::list_shipments))
        .route("/{id}/status", post(shipments::update_shipment))
}
