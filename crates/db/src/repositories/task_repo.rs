//! Repository for the `tasks` table.
//!
//! Tasks are created by approving an application and change status only
//! through [`crate::repositories::WorkflowRepo`].

use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{Task, TaskOwner};

pub(crate) const COLUMNS: &str = "id, campaign_id, creator_id, application_id, status, feedback, \
                                  created_at, updated_at";

pub struct TaskRepo;

impl TaskRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_campaign(pool: &PgPool, campaign_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE campaign_id = $1 ORDER BY created_at");
        sqlx::query_as::<_, Task>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_creator(pool: &PgPool, creator_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE creator_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(creator_id)
            .fetch_all(pool)
            .await
    }

    /// Resolve the creator and brand that own a task.
    pub async fn find_owner(pool: &PgPool, task_id: DbId) -> Result<Option<TaskOwner>, sqlx::Error> {
        sqlx::query_as::<_, TaskOwner>(
            "SELECT t.id AS task_id, t.creator_id, c.brand_id
             FROM tasks t JOIN campaigns c ON c.id = t.campaign_id
             WHERE t.id = $1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }
}
