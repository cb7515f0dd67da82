use std::sync::Arc;

use axum::extract::ws::Message;
use leaders_events::ChangeEvent;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::ws::manager::WsManager;

/// Wire format sent to clients: `{ "type": "change", ... }`.
pub fn change_message(event: &ChangeEvent) -> Message {
    let body = json!({
        "type": "change",
        "table": event.table,
        "entity_id": event.entity_id,
        "action": event.action,
        "status": event.status,
        "timestamp": event.timestamp,
    });
    Message::Text(body.to_string().into())
}

/// Relay each bus event to the connections allowed to see it.
///
/// Ends when the bus is dropped. A lagging receiver skips the missed
/// events; clients recover on their next read.
pub fn start_forwarder(
    mut rx: broadcast::Receiver<ChangeEvent>,
    ws_manager: Arc<WsManager>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let delivered = ws_manager
                        .send_to_audience(&event.audience, change_message(&event))
                        .await;
                    tracing::trace!(table = %event.table, entity_id = %event.entity_id, delivered, "Forwarded change event");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change forwarder lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::info!("Change forwarder stopped");
    })
}
