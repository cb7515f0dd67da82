//! Background cleanup of the `sessions` table.
//!
//! Every refresh rotation leaves a revoked row behind; expired and revoked
//! rows are never read again.

use std::time::Duration;

use leaders_db::repositories::SessionRepo;
use leaders_db::DbPool;
use tokio::task::JoinHandle;

/// How often expired and revoked sessions are deleted.
pub const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Spawn a task that deletes dead sessions every `interval`.
///
/// Runs until aborted through the returned handle.
pub fn start_session_cleanup(pool: DbPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match SessionRepo::cleanup_expired(&pool).await {
                Ok(0) => {}
                Ok(deleted) => tracing::debug!(deleted, "Removed expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    })
}
