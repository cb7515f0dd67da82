use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use leaders_core::types::{DbId, Timestamp};
use leaders_events::Audience;
use tokio::sync::{mpsc, RwLock};

/// Sender half for pushing messages to one WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Who is on the other end of a connection, for scoping the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: DbId,
    pub is_staff: bool,
    /// Brands the user belonged to when the socket connected.
    pub brand_ids: Vec<DbId>,
}

impl Viewer {
    pub fn staff(user_id: DbId) -> Self {
        Self {
            user_id,
            is_staff: true,
            brand_ids: Vec::new(),
        }
    }

    pub fn user(user_id: DbId) -> Self {
        Self {
            user_id,
            is_staff: false,
            brand_ids: Vec::new(),
        }
    }

    pub fn with_brands(mut self, brand_ids: Vec<DbId>) -> Self {
        self.brand_ids = brand_ids;
        self
    }

    pub fn can_see(&self, audience: &Audience) -> bool {
        self.is_staff
            || audience.creator_id == Some(self.user_id)
            || audience
                .brand_id
                .is_some_and(|brand_id| self.brand_ids.contains(&brand_id))
    }
}

pub struct WsConnection {
    pub viewer: Viewer,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Tracks every live WebSocket connection.
///
/// Interior `RwLock`; share it behind an `Arc`.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and return the receiver its writer task drains.
    pub async fn add(&self, conn_id: String, viewer: Viewer) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            viewer,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Send a message to every connection. Returns how many accepted it.
    ///
    /// Closed channels are skipped; their reader loop removes them.
    pub async fn broadcast(&self, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Send a message to every connection whose viewer may see `audience`.
    pub async fn send_to_audience(&self, audience: &Audience, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.viewer.can_see(audience))
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Send a message to every connection of one user.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.viewer.user_id == user_id)
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then forget them.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
