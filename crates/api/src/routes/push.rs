//! Route definitions for `/push`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::push;
use crate::state::AppState;

/// Routes mounted at `/push`.
///
/// ```text
/// POST   /send                  -> send (sender roles, rate limited)
/// POST   /subscriptions         -> subscribe
/// DELETE /subscriptions         -> unsubscribe
/// GET    /vapid-public-key      -> vapid_public_key
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(push::send))
        .route(
            "/subscriptions",
            post(push::subscribe).delete(push::unsubscribe),
        )
        .route("/vapid-public-key", get(push::vapid_public_key))
}
