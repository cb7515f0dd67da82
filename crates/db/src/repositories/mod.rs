//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or a connection inside a transaction) as the first
//! argument.

pub mod application_repo;
pub mod audit_repo;
pub mod brand_repo;
pub mod campaign_repo;
pub mod dispute_repo;
pub mod notification_preference_repo;
pub mod payment_repo;
pub mod profile_repo;
pub mod push_subscription_repo;
pub mod rate_limit_repo;
pub mod session_repo;
pub mod shipment_repo;
pub mod task_repo;
pub mod user_repo;
pub mod workflow_repo;

pub use application_repo::ApplicationRepo;
pub use audit_repo::AuditLogRepo;
pub use brand_repo::BrandRepo;
pub use campaign_repo::CampaignRepo;
pub use dispute_repo::DisputeRepo;
pub use notification_preference_repo::NotificationPreferenceRepo;
pub use payment_repo::PaymentRepo;
pub use profile_repo::ProfileRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
pub use rate_limit_repo::{RateLimitHit, RateLimitRepo};
pub use session_repo::SessionRepo;
pub use shipment_repo::ShipmentRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
pub use workflow_repo::{StatusChange, StatusTable, WorkflowRepo};

/// Qualify a comma-separated column list with a table alias.
pub(crate) fn qualify(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_prefixes_every_column() {
        assert_eq!(qualify("id, task_id,status", "p"), "p.id, p.task_id, p.status");
    }
}
