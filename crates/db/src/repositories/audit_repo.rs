//! Repository for the `audit_logs` table.

use leaders_core::audit::redact_sensitive_fields;
use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const COLUMNS: &str = "\
    id, actor_id, action, entity_type, entity_id, \
    from_status, to_status, details, created_at";

/// Shared filter; every parameter is optional.
const FILTER: &str = "\
    WHERE ($1::uuid IS NULL OR actor_id = $1) \
      AND ($2::text IS NULL OR action = $2) \
      AND ($3::text IS NULL OR entity_type = $3) \
      AND ($4::uuid IS NULL OR entity_id = $4) \
      AND ($5::timestamptz IS NULL OR created_at >= $5) \
      AND ($6::timestamptz IS NULL OR created_at <= $6)";

// ---------------------------------------------------------------------------
// AuditLogRepo
// ---------------------------------------------------------------------------

/// Append and query operations for the audit trail.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry.
    ///
    /// Generic over the executor so callers can write the audit row in the
    /// same transaction as the change it describes.
    pub async fn insert<'e, E>(executor: E, entry: &CreateAuditLog) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO audit_logs \
                (actor_id, action, entity_type, entity_id, from_status, to_status, details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.from_status)
        .bind(&entry.to_status)
        .bind(redact_sensitive_fields(&entry.details))
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Query audit logs with filtering and pagination, newest first.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 500);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs {FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.actor_id)
            .bind(&params.action)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .bind(params.from)
            .bind(params.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count audit logs matching the given filter (for pagination metadata).
    pub async fn count(pool: &PgPool, params: &AuditQuery) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*)::BIGINT FROM audit_logs {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(params.actor_id)
            .bind(&params.action)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .bind(params.from)
            .bind(params.to)
            .fetch_one(pool)
            .await
    }
}
