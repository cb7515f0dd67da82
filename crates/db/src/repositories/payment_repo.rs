//! Repository for the `payments` table.

use leaders_core::audit::{actions, entities};
use leaders_core::status::{PaymentStatus, Transition};
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::CreateAuditLog;
use crate::models::payment::{CreatePayment, Payment};
use crate::models::visibility::Visibility;
use crate::repositories::{qualify, AuditLogRepo};

const COLUMNS: &str = "id, task_id, amount_cents, currency, status, proof_path, paid_at, \
                       created_at, updated_at";

pub struct PaymentRepo;

impl PaymentRepo {
    /// Create a `pending` payment for a task.
    pub async fn create(
        pool: &PgPool,
        task_id: DbId,
        input: &CreatePayment,
        actor_id: DbId,
    ) -> Result<Payment, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO payments (task_id, amount_cents, currency, status)
             VALUES ($1, $2, COALESCE($3, 'USD'), $4)
             RETURNING {COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(task_id)
            .bind(input.amount_cents)
            .bind(&input.currency)
            .bind(PaymentStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(Some(actor_id), actions::ENTITY_CREATE, entities::PAYMENT, payment.id)
                .with_details(serde_json::json!({
                    "task_id": task_id,
                    "amount_cents": input.amount_cents,
                })),
        )
        .await?;
        tx.commit().await?;
        Ok(payment)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Payments visible to the caller, newest first.
    pub async fn list(pool: &PgPool, visibility: Visibility) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM payments p
             JOIN tasks t ON t.id = p.task_id
             JOIN campaigns c ON c.id = t.campaign_id
             WHERE {}
             ORDER BY p.created_at DESC",
            qualify(COLUMNS, "p"),
            visibility.task_predicate()
        );
        let mut q = sqlx::query_as::<_, Payment>(&query);
        if let Some(user_id) = visibility.user_id() {
            q = q.bind(user_id);
        }
        q.fetch_all(pool).await
    }
}
