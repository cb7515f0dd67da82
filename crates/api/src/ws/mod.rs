//! WebSocket infrastructure for the realtime change feed.
//!
//! Connection management, heartbeat, the HTTP upgrade handler, and the
//! forwarder that relays [`leaders_events::ChangeEvent`]s to clients.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::{change_message, start_forwarder};
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{Viewer, WsManager};
