//! Repository for `shipment_requests` and `shipments`.

use leaders_core::audit::{actions, entities};
use leaders_core::status::{ShipmentRequestStatus, Transition};
use leaders_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::CreateAuditLog;
use crate::models::shipment::{CreateShipmentRequest, Shipment, ShipmentRequest};
use crate::models::visibility::Visibility;
use crate::repositories::{qualify, AuditLogRepo};

pub(crate) const REQUEST_COLUMNS: &str = "id, task_id, address, status, created_at, updated_at";

pub(crate) const SHIPMENT_COLUMNS: &str = "id, shipment_request_id, carrier, tracking_number, \
                                           status, created_at, updated_at";

pub struct ShipmentRepo;

impl ShipmentRepo {
    /// File a `pending` shipment request for a task.
    pub async fn create_request(
        pool: &PgPool,
        task_id: DbId,
        input: &CreateShipmentRequest,
        actor_id: DbId,
    ) -> Result<ShipmentRequest, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO shipment_requests (task_id, address, status)
             VALUES ($1, $2, $3)
             RETURNING {REQUEST_COLUMNS}"
        );
        let request = sqlx::query_as::<_, ShipmentRequest>(&query)
            .bind(task_id)
            .bind(&input.address)
            .bind(ShipmentRequestStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog::new(
                Some(actor_id),
                actions::ENTITY_CREATE,
                entities::SHIPMENT_REQUEST,
                request.id,
            ),
        )
        .await?;
        tx.commit().await?;
        Ok(request)
    }

    pub async fn find_request(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ShipmentRequest>, sqlx::Error> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM shipment_requests WHERE id = $1");
        sqlx::query_as::<_, ShipmentRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_requests(
        pool: &PgPool,
        visibility: Visibility,
    ) -> Result<Vec<ShipmentRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM shipment_requests r
             JOIN tasks t ON t.id = r.task_id
             JOIN campaigns c ON c.id = t.campaign_id
             WHERE {}
             ORDER BY r.created_at DESC",
            qualify(REQUEST_COLUMNS, "r"),
            visibility.task_predicate()
        );
        let mut q = sqlx::query_as::<_, ShipmentRequest>(&query);
        if let Some(user_id) = visibility.user_id() {
            q = q.bind(user_id);
        }
        q.fetch_all(pool).await
    }

    pub async fn find_shipment(pool: &PgPool, id: DbId) -> Result<Option<Shipment>, sqlx::Error> {
        let query = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1");
        sqlx::query_as::<_, Shipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve the task a shipment belongs to.
    pub async fn task_id_of_shipment(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT r.task_id FROM shipments s
             JOIN shipment_requests r ON r.id = s.shipment_request_id
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_shipments(
        pool: &PgPool,
        visibility: Visibility,
    ) -> Result<Vec<Shipment>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM shipments s
             JOIN shipment_requests r ON r.id = s.shipment_request_id
             JOIN tasks t ON t.id = r.task_id
             JOIN campaigns c ON c.id = t.campaign_id
             WHERE {}
             ORDER BY s.created_at DESC",
            qualify(SHIPMENT_COLUMNS, "s"),
            visibility.task_predicate()
        );
        let mut q = sqlx::query_as::<_, Shipment>(&query);
        if let Some(user_id) = visibility.user_id() {
            q = q.bind(user_id);
        }
        q.fetch_all(pool).await
    }
}
