//! Well-known role name constants.
//!
//! These must match the `ck_profiles_role` CHECK constraint in
//! `20260301000002_create_profiles.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_FINANCE: &str = "finance";
pub const ROLE_SUPPORT: &str = "support";
pub const ROLE_CONTENT_OPS: &str = "content_ops";
pub const ROLE_BRAND_MANAGER: &str = "brand_manager";
pub const ROLE_BRAND_USER: &str = "brand_user";
pub const ROLE_CREATOR: &str = "creator";

/// Every role the platform knows about.
pub const ALL_ROLES: &[&str] = &[
    ROLE_ADMIN,
    ROLE_FINANCE,
    ROLE_SUPPORT,
    ROLE_CONTENT_OPS,
    ROLE_BRAND_MANAGER,
    ROLE_BRAND_USER,
    ROLE_CREATOR,
];

/// Internal staff roles. Staff can read every brand's data.
pub const STAFF_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_FINANCE, ROLE_SUPPORT, ROLE_CONTENT_OPS];

/// Roles held by members of a brand account.
pub const BRAND_ROLES: &[&str] = &[ROLE_BRAND_MANAGER, ROLE_BRAND_USER];

/// Roles allowed to settle payments.
pub const FINANCE_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_FINANCE];

/// Roles allowed to triage and resolve disputes.
pub const DISPUTE_RESOLVER_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_SUPPORT];

pub fn is_known(role: &str) -> bool {
    ALL_ROLES.contains(&role)
}

pub fn is_staff(role: &str) -> bool {
    STAFF_ROLES.contains(&role)
}

pub fn is_brand(role: &str) -> bool {
    BRAND_ROLES.contains(&role)
}

pub fn is_creator(role: &str) -> bool {
    role == ROLE_CREATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_and_brand_groups_are_disjoint() {
        for role in STAFF_ROLES {
            assert!(!is_brand(role), "{role} must not be a brand role");
        }
        assert!(!is_staff(ROLE_CREATOR));
        assert!(!is_brand(ROLE_CREATOR));
    }

    #[test]
    fn every_grouped_role_is_known() {
        for role in STAFF_ROLES.iter().chain(BRAND_ROLES) {
            assert!(is_known(role));
        }
        assert!(!is_known("superuser"));
    }
}
