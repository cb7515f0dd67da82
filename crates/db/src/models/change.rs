//! Committed state changes, reported back to callers for realtime fan-out.

use leaders_core::types::DbId;

/// One row whose status changed (or that was created) in a committed
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// Table name, used as the realtime channel.
    pub table: &'static str,
    pub entity_id: DbId,
    /// `"insert"` or `"update"`.
    pub action: &'static str,
    pub status: &'static str,
}

impl AppliedChange {
    pub fn updated(table: &'static str, entity_id: DbId, status: &'static str) -> Self {
        Self {
            table,
            entity_id,
            action: "update",
            status,
        }
    }

    pub fn inserted(table: &'static str, entity_id: DbId, status: &'static str) -> Self {
        Self {
            table,
            entity_id,
            action: "insert",
            status,
        }
    }
}
