use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use leaders_core::error::CoreError;
use leaders_core::roles;
use leaders_db::repositories::BrandRepo;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;
use crate::ws::manager::{Viewer, WsManager};

/// Browsers cannot set headers on a WebSocket handshake, so the access
/// token travels as `?token=`.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

/// GET /api/ws?token=<access token>
///
/// Authenticates, then upgrades the connection and registers it with
/// [`WsManager`]. Staff receive every change; others receive changes for
/// their brands and their own rows.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let claims = validate_token(&query.token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    let viewer = if roles::is_staff(&claims.role) {
        Viewer::staff(claims.sub)
    } else if roles::is_brand(&claims.role) {
        let brand_ids = BrandRepo::list_for_member(&state.pool, claims.sub)
            .await?
            .into_iter()
            .map(|brand| brand.id)
            .collect();
        Viewer::user(claims.sub).with_brands(brand_ids)
    } else {
        Viewer::user(claims.sub)
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, viewer)))
}

/// Drive one connection: a writer task drains the manager channel into
/// the sink while this task reads until the client goes away.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, viewer: Viewer) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        conn_id = %conn_id,
        user_id = %viewer.user_id,
        brands = viewer.brand_ids.len(),
        "WebSocket connected"
    );

    let mut rx = ws_manager.add(conn_id.clone(), viewer).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // The feed is server-to-client; inbound frames other than Close are ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
