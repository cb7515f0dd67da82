//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches where the entity has one

pub mod application;
pub mod audit;
pub mod brand;
pub mod campaign;
pub mod change;
pub mod dispute;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod push_subscription;
pub mod session;
pub mod shipment;
pub mod task;
pub mod user;
pub mod visibility;
