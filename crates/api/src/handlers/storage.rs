//! Streaming reads from the local object store.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use leaders_core::storage::{content_type_for, task_id_from_upload_path, BUCKET_TASK_UPLOADS};
use tokio_util::io::ReaderStream;

use crate::access::task_relation;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/storage/task-uploads/{*path}
///
/// Readable by staff, the task's creator and members of its brand.
pub async fn task_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let task_id = task_id_from_upload_path(&path)?;
    task_relation(&state.pool, &auth, task_id).await?;

    let full_path = state
        .config
        .storage
        .root
        .join(BUCKET_TASK_UPLOADS)
        .join(&path);
    let file = match tokio::fs::File::open(&full_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        Err(e) => return Err(AppError::InternalError(format!("Failed to open object: {e}"))),
    };
    let length = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
        ],
        body,
    )
        .into_response())
}
