//! Errors for multi-step repository operations.
//!
//! Single-statement repositories return `sqlx::Error` directly. Operations
//! that also enforce domain rules (status transitions, role grants) can
//! fail either way and return [`DbError`].

use leaders_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
