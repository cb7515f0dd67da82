pub mod admin;
pub mod applications;
pub mod auth;
pub mod brands;
pub mod campaigns;
pub mod disputes;
pub mod health;
pub mod me;
pub mod notifications;
pub mod payments;
pub mod push;
pub mod shipments;
pub mod storage;
pub mod tasks;

use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                        WebSocket change feed (?token=)
///
/// /auth/signup                               creator signup (public)
/// /auth/login                                login (public)
/// /auth/refresh                              refresh (public)
/// /auth/logout                               logout
///
/// /me                                        get, update own profile
///
/// /admin/create-brand                        provision brand + manager (admin)
/// /admin/set-admins                          grant staff roles (admin)
/// /admin/users                               list users (admin)
/// /admin/users/{id}/block                    block (admin)
/// /admin/users/{id}/unblock                  unblock (admin)
/// /admin/audit-logs                          query audit log (admin)
///
/// /brands                                    list
/// /brands/{id}                               get, update
/// /brands/{id}/verify                        verify (admin)
///
/// /campaigns                                 list, create
/// /campaigns/{id}                            get, update
/// /campaigns/{id}/status                     transition
/// /campaigns/{id}/kanban/tasks               task board
/// /campaigns/{id}/kanban/applications        application board
/// /campaigns/{id}/applications               list, apply
/// /campaigns/{id}/tasks                      list
///
/// /applications/mine                         caller's applications
/// /applications/{id}/status                  approve / reject
///
/// /tasks/mine                                caller's tasks
/// /tasks/{id}                                get
/// /tasks/{id}/status                         transition
/// /tasks/{id}/uploads                        upload deliverable
/// /tasks/{id}/payments                       create payment (finance)
/// /tasks/{id}/shipment-requests              request shipment
/// /tasks/{id}/disputes                       open dispute
///
/// /payments                                  list
/// /payments/{id}/status                      transition (finance)
///
/// /shipment-requests                         list
/// /shipment-requests/{id}/status             approve / reject
/// /shipments                                 list
/// /shipments/{id}/status                     transition
///
/// /disputes                                  list
/// /disputes/{id}/resolve                     advance (admin, support)
///
/// /push/send                                 send notification
/// /push/subscriptions                        subscribe, unsubscribe
/// /push/vapid-public-key                     VAPID public key
///
/// /notifications/preferences                 get, update channels
///
/// /storage/task-uploads/{*path}              download deliverable
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        // Realtime change feed.
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/me", me::router())
        .nest("/admin", admin::router())
        .nest("/brands", brands::router())
        // Campaigns with their applications, tasks and kanban views.
        .nest("/campaigns", campaigns::router())
        .nest("/applications", applications::router())
        .nest("/tasks", tasks::router(config.storage.max_upload_bytes))
        // Fulfilment.
        .nest("/payments", payments::router())
        .nest("/shipment-requests", shipments::requests_router())
        .nest("/shipments", shipments::shipments_router())
        .nest("/disputes", disputes::router())
        // Web Push and preferences.
        .nest("/push", push::router())
        .nest("/notifications", notifications::router())
        .nest("/storage", storage::router())
}
