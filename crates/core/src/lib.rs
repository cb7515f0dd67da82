//! Domain rules for the LEADERS platform.
//!
//! This crate has no I/O. It holds the pieces shared by the repository
//! layer, the event crate and the HTTP handlers:
//!
//! - [`status`] -- per-entity status enums and their transition tables.
//! - [`roles`] -- role names and the staff / brand / creator groupings.
//! - [`kanban`] -- fixed-bucket grouping for board views.
//! - [`push`] -- push payload validation and sender allow-list.
//! - [`rate_limit`] -- sliding-window limiter used by the push endpoint.
//! - [`provisioning`] -- input rules for admin brand provisioning.
//! - [`storage`] -- bucket names and object path validation.
//! - [`audit`] -- audit action names and detail redaction.

pub mod audit;
pub mod channels;
pub mod error;
pub mod kanban;
pub mod provisioning;
pub mod push;
pub mod rate_limit;
pub mod roles;
pub mod status;
pub mod storage;
pub mod types;
