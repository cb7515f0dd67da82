use axum::routing::get;
use axum::Router;

use crate::handlers::me;
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET    /      -> get_me
/// PUT    /      -> update_me
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(me::get_me).put(me::update_me))
}
