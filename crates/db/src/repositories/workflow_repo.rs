//! Central status transition engine.
//!
//! Every status change goes through [`compare_and_set`]: the move is
//! checked against the entity's transition table, applied with
//! `UPDATE ... WHERE id = $1 AND status = $2`, and its audit row is written
//! on the same connection. Public operations wrap one or more of these in a
//! single transaction so coupled changes (approving an application creates
//! a task, paying a payment pays the task, ...) commit or roll back
//! together.

use leaders_core::audit::{actions, entities};
use leaders_core::error::CoreError;
use leaders_core::status::{
    parse_stored, ApplicationStatus, CampaignStatus, DisputeStatus, PaymentStatus,
    ShipmentRequestStatus, ShipmentStatus, TaskStatus, Transition,
};
use leaders_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::application::Application;
use crate::models::audit::CreateAuditLog;
use crate::models::change::AppliedChange;
use crate::models::dispute::Dispute;
use crate::models::payment::Payment;
use crate::models::shipment::{Shipment, ShipmentRequest, ShipmentTracking};
use crate::models::task::Task;
use crate::repositories::{dispute_repo, shipment_repo, task_repo, AuditLogRepo};

// ---------------------------------------------------------------------------
// Status tables
// ---------------------------------------------------------------------------

/// Binds a status enum to the table holding its `status` column.
pub trait StatusTable: Transition {
    const TABLE: &'static str;
}

impl StatusTable for CampaignStatus {
    const TABLE: &'static str = "campaigns";
}

impl StatusTable for ApplicationStatus {
    const TABLE: &'static str = "applications";
}

impl StatusTable for TaskStatus {
    const TABLE: &'static str = "tasks";
}

impl StatusTable for PaymentStatus {
    const TABLE: &'static str = "payments";
}

impl StatusTable for ShipmentRequestStatus {
    const TABLE: &'static str = "shipment_requests";
}

impl StatusTable for ShipmentStatus {
    const TABLE: &'static str = "shipments";
}

impl StatusTable for DisputeStatus {
    const TABLE: &'static str = "disputes";
}

/// One requested move of a row from `from` to `to`.
#[derive(Debug, Clone)]
pub struct StatusChange<S> {
    pub id: DbId,
    pub from: S,
    pub to: S,
    pub actor_id: Option<DbId>,
    pub details: serde_json::Value,
}

impl<S: StatusTable> StatusChange<S> {
    pub fn new(id: DbId, from: S, to: S, actor_id: DbId) -> Self {
        Self {
            id,
            from,
            to,
            actor_id: Some(actor_id),
            details: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Apply one checked transition and its audit row on `conn`.
///
/// Fails with [`CoreError::InvalidTransition`] before touching the row if
/// the table forbids the move, and with [`CoreError::Conflict`] if the row
/// is no longer in `from` (another writer got there first).
pub async fn compare_and_set<S: StatusTable>(
    conn: &mut PgConnection,
    change: &StatusChange<S>,
) -> Result<AppliedChange, DbError> {
    change.from.check(change.to)?;

    let query = format!(
        "UPDATE {} SET status = $3 WHERE id = $1 AND status = $2",
        S::TABLE
    );
    let result = sqlx::query(&query)
        .bind(change.id)
        .bind(change.from.as_str())
        .bind(change.to.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::Conflict(format!(
            "{} {} is no longer '{}'",
            S::ENTITY,
            change.id,
            change.from
        ))
        .into());
    }

    AuditLogRepo::insert(
        &mut *conn,
        &CreateAuditLog {
            actor_id: change.actor_id,
            action: actions::STATUS_CHANGE,
            entity_type: S::ENTITY,
            entity_id: Some(change.id),
            from_status: Some(change.from.as_str().to_string()),
            to_status: Some(change.to.as_str().to_string()),
            details: change.details.clone(),
        },
    )
    .await?;

    tracing::debug!(
        entity = S::ENTITY,
        id = %change.id,
        from = %change.from,
        to = %change.to,
        "Status transition applied",
    );

    Ok(AppliedChange::updated(S::TABLE, change.id, change.to.as_str()))
}

/// Read and row-lock a task's current status.
async fn lock_task_status(conn: &mut PgConnection, task_id: DbId) -> Result<TaskStatus, DbError> {
    let raw: Option<String> = sqlx::query_scalar("SELECT status FROM tasks WHERE id = $1 FOR UPDATE")
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await?;
    let raw = raw.ok_or(CoreError::NotFound {
        entity: entities::TASK,
        id: task_id,
    })?;
    Ok(parse_stored::<TaskStatus>(&raw)?)
}

// ---------------------------------------------------------------------------
// WorkflowRepo
// ---------------------------------------------------------------------------

pub struct WorkflowRepo;

impl WorkflowRepo {
    /// Apply a single transition with no coupled effects.
    pub async fn transition<S: StatusTable>(
        pool: &PgPool,
        change: &StatusChange<S>,
    ) -> Result<Vec<AppliedChange>, DbError> {
        let mut tx = pool.begin().await?;
        let applied = compare_and_set(&mut tx, change).await?;
        tx.commit().await?;
        Ok(vec![applied])
    }

    /// Move a task, optionally recording reviewer feedback.
    ///
    /// `paid` and `disputed` are refused here; they are reached only
    /// through a payment or a dispute.
    pub async fn transition_task(
        pool: &PgPool,
        change: &StatusChange<TaskStatus>,
        feedback: Option<&str>,
    ) -> Result<Vec<AppliedChange>, DbError> {
        if change.to.is_derived() {
            return Err(CoreError::Validation(format!(
                "task status '{}' is set through its {} record",
                change.to,
                if change.to == TaskStatus::Paid { "payment" } else { "dispute" }
            ))
            .into());
        }

        let mut tx = pool.begin().await?;
        let applied = compare_and_set(&mut tx, change).await?;
        if let Some(feedback) = feedback {
            sqlx::query("UPDATE tasks SET feedback = $2 WHERE id = $1")
                .bind(change.id)
                .bind(feedback)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(vec![applied])
    }

    /// Approve or reject an application.
    ///
    /// Approval creates the creator's task in `selected` in the same
    /// transaction. A creator who already has a task on the campaign
    /// fails on `uq_tasks_campaign_creator`.
    pub async fn decide_application(
        pool: &PgPool,
        application: &Application,
        to: ApplicationStatus,
        actor_id: DbId,
    ) -> Result<(Vec<AppliedChange>, Option<Task>), DbError> {
        let from = parse_stored::<ApplicationStatus>(&application.status)?;
        let mut tx = pool.begin().await?;
        let mut applied = vec![
            compare_and_set(&mut tx, &StatusChange::new(application.id, from, to, actor_id))
                .await?,
        ];

        let mut task = None;
        if to == ApplicationStatus::Approved {
            let query = format!(
                "INSERT INTO tasks (campaign_id, creator_id, application_id, status)
                 VALUES ($1, $2, $3, $4)
                 RETURNING {}",
                task_repo::COLUMNS
            );
            let created = sqlx::query_as::<_, Task>(&query)
                .bind(application.campaign_id)
                .bind(application.creator_id)
                .bind(application.id)
                .bind(TaskStatus::Selected.as_str())
                .fetch_one(&mut *tx)
                .await?;
            AuditLogRepo::insert(
                &mut *tx,
                &CreateAuditLog::new(Some(actor_id), actions::ENTITY_CREATE, entities::TASK, created.id)
                    .with_details(serde_json::json!({ "application_id": application.id })),
            )
            .await?;
            applied.push(AppliedChange::inserted(
                TaskStatus::TABLE,
                created.id,
                TaskStatus::Selected.as_str(),
            ));
            task = Some(created);
        }

        tx.commit().await?;
        Ok((applied, task))
    }

    /// Move a payment. Marking it `paid` stamps `paid_at` and moves the
    /// task from `approved` to `paid`; if the task is not `approved` the
    /// whole change is rejected.
    pub async fn set_payment_status(
        pool: &PgPool,
        payment: &Payment,
        to: PaymentStatus,
        actor_id: DbId,
    ) -> Result<Vec<AppliedChange>, DbError> {
        let from = parse_stored::<PaymentStatus>(&payment.status)?;
        let mut tx = pool.begin().await?;
        let mut applied = vec![
            compare_and_set(
                &mut tx,
                &StatusChange::new(payment.id, from, to, actor_id)
                    .with_details(serde_json::json!({ "amount_cents": payment.amount_cents })),
            )
            .await?,
        ];

        if to == PaymentStatus::Paid {
            sqlx::query("UPDATE payments SET paid_at = NOW() WHERE id = $1")
                .bind(payment.id)
                .execute(&mut *tx)
                .await?;

            let task_status = lock_task_status(&mut tx, payment.task_id).await?;
            applied.push(
                compare_and_set(
                    &mut tx,
                    &StatusChange::new(payment.task_id, task_status, TaskStatus::Paid, actor_id)
                        .with_details(serde_json::json!({ "payment_id": payment.id })),
                )
                .await?,
            );
        }

        tx.commit().await?;
        Ok(applied)
    }

    /// Open a dispute on a task and move the task to `disputed`.
    pub async fn open_dispute(
        pool: &PgPool,
        task_id: DbId,
        raised_by: DbId,
        reason: &str,
    ) -> Result<(Dispute, Vec<AppliedChange>), DbError> {
        let mut tx = pool.begin().await?;
        let task_status = lock_task_status(&mut tx, task_id).await?;
        task_status.check(TaskStatus::Disputed)?;

        let query = format!(
            "INSERT INTO disputes (task_id, raised_by, reason, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            dispute_repo::COLUMNS
        );
        let dispute = sqlx::query_as::<_, Dispute>(&query)
            .bind(task_id)
            .bind(raised_by)
            .bind(reason)
            .bind(DisputeStatus::Open.as_str())
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(Some(raised_by), actions::ENTITY_CREATE, entities::DISPUTE, dispute.id)
                .with_details(serde_json::json!({ "task_id": task_id })),
        )
        .await?;

        let mut applied = vec![AppliedChange::inserted(
            DisputeStatus::TABLE,
            dispute.id,
            DisputeStatus::Open.as_str(),
        )];
        applied.push(
            compare_and_set(
                &mut tx,
                &StatusChange::new(task_id, task_status, TaskStatus::Disputed, raised_by)
                    .with_details(serde_json::json!({ "dispute_id": dispute.id })),
            )
            .await?,
        );

        tx.commit().await?;
        Ok((dispute, applied))
    }

    /// Advance a dispute. Resolving returns the task to `approved`;
    /// rejecting sends it back to `needs_edits`.
    pub async fn advance_dispute(
        pool: &PgPool,
        dispute: &Dispute,
        to: DisputeStatus,
        actor_id: DbId,
        note: Option<&str>,
    ) -> Result<Vec<AppliedChange>, DbError> {
        let from = parse_stored::<DisputeStatus>(&dispute.status)?;
        let mut tx = pool.begin().await?;
        let mut applied =
            vec![compare_and_set(&mut tx, &StatusChange::new(dispute.id, from, to, actor_id)).await?];

        if let Some(outcome) = to.task_outcome() {
            sqlx::query(
                "UPDATE disputes SET
                    resolution_note = $2, resolved_by = $3, resolved_at = NOW()
                 WHERE id = $1",
            )
            .bind(dispute.id)
            .bind(note)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;

            applied.push(
                compare_and_set(
                    &mut tx,
                    &StatusChange::new(dispute.task_id, TaskStatus::Disputed, outcome, actor_id)
                        .with_details(serde_json::json!({ "dispute_id": dispute.id })),
                )
                .await?,
            );
        }

        tx.commit().await?;
        Ok(applied)
    }

    /// Approve or reject a shipment request. Approval creates the
    /// shipment in `preparing`.
    pub async fn decide_shipment_request(
        pool: &PgPool,
        request: &ShipmentRequest,
        to: ShipmentRequestStatus,
        actor_id: DbId,
    ) -> Result<(Vec<AppliedChange>, Option<Shipment>), DbError> {
        let from = parse_stored::<ShipmentRequestStatus>(&request.status)?;
        let mut tx = pool.begin().await?;
        let mut applied =
            vec![compare_and_set(&mut tx, &StatusChange::new(request.id, from, to, actor_id)).await?];

        let mut shipment = None;
        if to == ShipmentRequestStatus::Approved {
            let query = format!(
                "INSERT INTO shipments (shipment_request_id, status)
                 VALUES ($1, $2)
                 RETURNING {}",
                shipment_repo::SHIPMENT_COLUMNS
            );
            let created = sqlx::query_as::<_, Shipment>(&query)
                .bind(request.id)
                .bind(ShipmentStatus::Preparing.as_str())
                .fetch_one(&mut *tx)
                .await?;
            AuditLogRepo::insert(
                &mut *tx,
                &CreateAuditLog::new(
                    Some(actor_id),
                    actions::ENTITY_CREATE,
                    entities::SHIPMENT,
                    created.id,
                ),
            )
            .await?;
            applied.push(AppliedChange::inserted(
                ShipmentStatus::TABLE,
                created.id,
                ShipmentStatus::Preparing.as_str(),
            ));
            shipment = Some(created);
        }

        tx.commit().await?;
        Ok((applied, shipment))
    }

    /// Move a shipment, recording carrier details when given.
    pub async fn update_shipment(
        pool: &PgPool,
        shipment: &Shipment,
        to: ShipmentStatus,
        tracking: &ShipmentTracking,
        actor_id: DbId,
    ) -> Result<Vec<AppliedChange>, DbError> {
        let from = parse_stored::<ShipmentStatus>(&shipment.status)?;
        let mut tx = pool.begin().await?;
        let applied = compare_and_set(
            &mut tx,
            &StatusChange::new(shipment.id, from, to, actor_id).with_details(serde_json::json!({
                "carrier": tracking.carrier,
                "tracking_number": tracking.tracking_number,
            })),
        )
        .await?;
        sqlx::query(
            "UPDATE shipments SET
                carrier = COALESCE($2, carrier),
                tracking_number = COALESCE($3, tracking_number)
             WHERE id = $1",
        )
        .bind(shipment.id)
        .bind(&tracking.carrier)
        .bind(&tracking.tracking_number)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(vec![applied])
    }

    /// Record an uploaded deliverable. A task in `in_production` or
    /// `needs_edits` moves to `uploaded`; later uploads are only audited.
    pub async fn record_upload(
        pool: &PgPool,
        task: &Task,
        actor_id: DbId,
        object_path: &str,
    ) -> Result<Vec<AppliedChange>, DbError> {
        let mut tx = pool.begin().await?;
        let current = lock_task_status(&mut tx, task.id).await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(Some(actor_id), actions::UPLOAD, entities::TASK, task.id)
                .with_details(serde_json::json!({ "path": object_path })),
        )
        .await?;

        let mut applied = Vec::new();
        if current.accepts_upload() {
            applied.push(
                compare_and_set(
                    &mut tx,
                    &StatusChange::new(task.id, current, TaskStatus::Uploaded, actor_id)
                        .with_details(serde_json::json!({ "path": object_path })),
                )
                .await?,
            );
        }
        tx.commit().await?;
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tables_match_entity_names() {
        assert_eq!(TaskStatus::TABLE, "tasks");
        assert_eq!(TaskStatus::ENTITY, entities::TASK);
        assert_eq!(ShipmentRequestStatus::ENTITY, entities::SHIPMENT_REQUEST);
        assert_eq!(DisputeStatus::ENTITY, entities::DISPUTE);
    }
}
