//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ChangeEvent`]s. It is
//! shared via `Arc<EventBus>` across the application. Events are published
//! only after the transaction that produced them commits.

use chrono::{DateTime, Utc};
use leaders_core::types::DbId;
use leaders_db::models::change::AppliedChange;
use leaders_db::models::task::TaskOwner;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Audience
// ---------------------------------------------------------------------------

/// Who may receive an event on the realtime feed besides staff, who
/// receive everything.
///
/// An empty audience reaches staff only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    /// Members of this brand.
    pub brand_id: Option<DbId>,
    /// The creator the row belongs to.
    pub creator_id: Option<DbId>,
}

impl Audience {
    pub fn staff_only() -> Self {
        Self::default()
    }

    pub fn brand(brand_id: DbId) -> Self {
        Self {
            brand_id: Some(brand_id),
            creator_id: None,
        }
    }

    pub fn with_creator(mut self, creator_id: DbId) -> Self {
        self.creator_id = Some(creator_id);
        self
    }
}

impl From<&TaskOwner> for Audience {
    fn from(owner: &TaskOwner) -> Self {
        Audience::brand(owner.brand_id).with_creator(owner.creator_id)
    }
}

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A committed insert or status change on a workflow table.
///
/// Constructed via [`ChangeEvent::new`] and enriched with
/// [`with_status`](ChangeEvent::with_status),
/// [`with_actor`](ChangeEvent::with_actor) and
/// [`with_audience`](ChangeEvent::with_audience).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Table the row lives in, e.g. `"tasks"`.
    pub table: String,

    pub entity_id: DbId,

    /// `"insert"` or `"update"`.
    pub action: String,

    /// New status, when the change carried one.
    pub status: Option<String>,

    /// Id of the user that caused the change.
    pub actor_user_id: Option<DbId>,

    /// Recipients on the realtime feed. Defaults to staff only.
    #[serde(default)]
    pub audience: Audience,

    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, entity_id: DbId, action: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            entity_id,
            action: action.into(),
            status: None,
            actor_user_id: None,
            audience: Audience::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }
}

impl From<&AppliedChange> for ChangeEvent {
    fn from(change: &AppliedChange) -> Self {
        ChangeEvent::new(change.table, change.entity_id, change.action).with_status(change.status)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use leaders_events::bus::{ChangeEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ChangeEvent::new("tasks", uuid::Uuid::nil(), "update"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no active subscribers the event is dropped; realtime delivery
    /// is best-effort and clients catch up on their next read.
    pub fn publish(&self, event: ChangeEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Publish every change from one committed transaction to `audience`.
    pub fn publish_changes(&self, changes: &[AppliedChange], actor_id: DbId, audience: Audience) {
        for change in changes {
            self.publish(
                ChangeEvent::from(change)
                    .with_actor(actor_id)
                    .with_audience(audience),
            );
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
