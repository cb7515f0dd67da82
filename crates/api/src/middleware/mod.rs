//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller, from a JWT Bearer token.
//! - [`rbac`] -- role gates wrapping [`auth::AuthUser`] (`RequireAdmin`,
//!   `RequireStaff`, `RequireFinance`, `RequireDisputeResolver`,
//!   `RequireCreator`).

pub mod auth;
pub mod rbac;
