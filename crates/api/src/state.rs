use std::sync::Arc;

use crate::config::ServerConfig;
use crate::push::PushService;
use crate::rate_limit::RateLimiter;
use crate::ws::WsManager;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: leaders_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager.
    pub ws_manager: Arc<WsManager>,
    /// Committed change events, forwarded to WebSocket clients.
    pub event_bus: Arc<leaders_events::EventBus>,
    /// `None` when VAPID keys are not configured.
    pub push: Option<Arc<PushService>>,
    /// Push send limiter.
    pub push_limiter: Arc<dyn RateLimiter>,
}
