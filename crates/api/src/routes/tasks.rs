//! Route definitions for `/tasks` and the task-scoped payment, shipment
//! and dispute collections.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{disputes, payments, shipments, tasks};
use crate::state::AppState;

/// Allowance for multipart boundaries and headers on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /mine                          -> mine
/// GET    /{id}                          -> get
/// POST   /{id}/status                   -> set_status
/// POST   /{id}/uploads                  -> upload (multipart, creator)
///
/// POST   /{id}/payments                 -> payments::create (finance)
/// POST   /{id}/shipment-requests        -> shipments::create_request (creator)
/// POST   /{id}/disputes                 -> disputes::create
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/mine", get(tasks::mine))
        .route("/{id}", get(tasks::get))
        .route("/{id}/status", post(tasks::set_status))
        .route(
            "/{id}/uploads",
            post(tasks::upload).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/{id}/payments", post(payments::create))
        .route("/{id}/shipment-requests", post(shipments::create_request))
        .route("/{id}/disputes", post(disputes::create))
}
