//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access-token signing/validation and refresh-token helpers.
//! - [`sessions`] -- periodic removal of dead refresh sessions.

pub mod jwt;
pub mod password;
pub mod sessions;
