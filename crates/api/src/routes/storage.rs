use axum::routing::get;
use axum::Router;

use crate::handlers::storage;
use crate::state::AppState;

/// Routes mounted at `/storage`.
///
/// ```text
/// GET    /task-uploads/{*path}      -> task_upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/task-uploads/{*path}", get(storage::task_upload))
}
