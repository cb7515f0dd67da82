//! Route definitions for `/campaigns` and the resources scoped under a
//! campaign.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{applications, campaigns, tasks};
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /                              -> list
/// POST   /                              -> create
/// GET    /{id}                          -> get
/// PUT    /{id}                          -> update
/// POST   /{id}/status                   -> set_status
///
/// GET    /{id}/kanban/tasks             -> task_board
/// GET    /{id}/kanban/applications      -> application_board
///
/// GET    /{id}/applications             -> applications::list_for_campaign
/// POST   /{id}/applications             -> applications::create (creator)
/// GET    /{id}/tasks                    -> tasks::list_for_campaign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(campaigns::list).post(campaigns::create))
        .route("/{id}", get(campaigns::get).put(campaigns::update))
        .route("/{id}/status", post(campaigns::set_status))
        // Kanban views
        .route("/{id}/kanban/tasks", get(campaigns::task_board))
        .route("/{id}/kanban/applications", get(campaigns::application_board))
        // Campaign-scoped collections
        .route(
            "/{id}/applications",
            get(applications::list_for_campaign).post(applications::create),
        )
        .route("/{id}/tasks", get(tasks::list_for_campaign))
}
