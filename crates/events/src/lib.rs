//! LEADERS event bus and push notification delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub for committed
//!   [`ChangeEvent`]s, backed by `tokio::sync::broadcast`. The API's
//!   WebSocket layer forwards these to connected clients.
//! - [`delivery`] -- Web Push delivery: RFC 8291 payload encryption,
//!   RFC 8292 VAPID authorization and the HTTP gateway.
//! - [`PushDispatcher`] -- fans one notification out to every browser
//!   subscription of a recipient, honouring channel preferences and
//!   pruning dead subscriptions.

pub mod bus;
pub mod delivery;
pub mod dispatch;

pub use bus::{Audience, ChangeEvent, EventBus};
pub use delivery::web_push::{PushError, PushGateway, PushTarget, WebPushGateway};
pub use dispatch::{DispatchReport, PgSubscriptionStore, PushDispatcher, SubscriptionStore};
