//! Row visibility derived from the caller's role.

use leaders_core::roles;
use leaders_core::types::DbId;

/// Which rows a caller may list.
///
/// Staff see everything, brand members see rows under their brands'
/// campaigns, creators see rows attached to their own tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    BrandMember(DbId),
    Creator(DbId),
}

impl Visibility {
    pub fn for_role(role: &str, user_id: DbId) -> Self {
        if roles::is_staff(role) {
            Visibility::All
        } else if roles::is_brand(role) {
            Visibility::BrandMember(user_id)
        } else {
            Visibility::Creator(user_id)
        }
    }

    /// SQL predicate over `t` (tasks) and `c` (campaigns) aliases.
    ///
    /// Non-`All` predicates reference the caller id as `$1`.
    pub(crate) fn task_predicate(self) -> &'static str {
        match self {
            Visibility::All => "TRUE",
            Visibility::BrandMember(_) => {
                "c.brand_id IN (SELECT brand_id FROM brand_members WHERE user_id = $1)"
            }
            Visibility::Creator(_) => "t.creator_id = $1",
        }
    }

    pub(crate) fn user_id(self) -> Option<DbId> {
        match self {
            Visibility::All => None,
            Visibility::BrandMember(id) | Visibility::Creator(id) => Some(id),
        }
    }
}
