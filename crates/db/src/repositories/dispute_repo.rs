//! Read side of the `disputes` table.
//!
//! Disputes are opened and advanced through
//! [`crate::repositories::WorkflowRepo`] because both move the task too.

use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::dispute::Dispute;
use crate::models::visibility::Visibility;
use crate::repositories::qualify;

pub(crate) const COLUMNS: &str = "id, task_id, raised_by, reason, status, resolution_note, \
                                  resolved_by, resolved_at, created_at, updated_at";

pub struct DisputeRepo;

impl DisputeRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dispute>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM disputes WHERE id = $1");
        sqlx::query_as::<_, Dispute>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, visibility: Visibility) -> Result<Vec<Dispute>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM disputes d
             JOIN tasks t ON t.id = d.task_id
             JOIN campaigns c ON c.id = t.campaign_id
             WHERE {}
             ORDER BY d.created_at DESC",
            qualify(COLUMNS, "d"),
            visibility.task_predicate()
        );
        let mut q = sqlx::query_as::<_, Dispute>(&query);
        if let Some(user_id) = visibility.user_id() {
            q = q.bind(user_id);
        }
        q.fetch_all(pool).await
    }
}
