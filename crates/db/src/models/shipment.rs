//! Shipment request and shipment models.

use leaders_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `shipment_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShipmentRequest {
    pub id: DbId,
    pub task_id: DbId,
    pub address: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /api/tasks/{id}/shipment-requests`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShipmentRequest {
    pub address: String,
}

/// A row from the `shipments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Shipment {
    pub id: DbId,
    pub shipment_request_id: DbId,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Carrier details recorded alongside a shipment status change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentTracking {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}
