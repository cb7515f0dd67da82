//! Handlers for campaign tasks: listing, status changes and deliverable
//! uploads.

use std::path::PathBuf;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use leaders_core::error::CoreError;
use leaders_core::status::{parse_stored, TaskStatus};
use leaders_core::storage::{sanitize_file_name, BUCKET_TASK_UPLOADS};
use leaders_core::types::DbId;
use leaders_db::models::task::Task;
use leaders_db::repositories::{StatusChange, TaskRepo, WorkflowRepo};
use leaders_events::Audience;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::access::{ensure_brand_access, load_campaign, load_task, task_relation, TaskRelation};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the deliverable.
const UPLOAD_FIELD: &str = "file";

const MAX_FEEDBACK_CHARS: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: String,
    /// Reviewer notes, stored on the task.
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResult {
    /// Object path inside the `task-uploads` bucket.
    pub path: String,
    pub size_bytes: u64,
    pub task: Task,
}

/// GET /api/campaigns/{id}/tasks
pub async fn list_for_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let campaign = load_campaign(&state.pool, campaign_id).await?;
    ensure_brand_access(&state.pool, &auth, campaign.brand_id).await?;
    let tasks = TaskRepo::list_for_campaign(&state.pool, campaign_id).await?;
    Ok(DataResponse::new(tasks))
}

/// GET /api/tasks/mine
pub async fn mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = TaskRepo::list_for_creator(&state.pool, auth.user_id).await?;
    Ok(DataResponse::new(tasks))
}

/// GET /api/tasks/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    task_relation(&state.pool, &auth, id).await?;
    let task = load_task(&state.pool, id).await?;
    Ok(DataResponse::new(task))
}

/// POST /api/tasks/{id}/status
///
/// Creators move their own task forward (start production, submit);
/// brand members and staff review. `paid` and `disputed` are rejected
/// here and reached through payments and disputes.
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<TaskStatusRequest>,
) -> AppResult<Json<DataResponse<Task>>> {
    let to = input.status.parse::<TaskStatus>()?;
    let (owner, relation) = task_relation(&state.pool, &auth, id).await?;
    let task = load_task(&state.pool, id).await?;
    let from = parse_stored::<TaskStatus>(&task.status)?;

    let permitted = match relation {
        TaskRelation::Creator => from.creator_may_set(to),
        TaskRelation::Staff | TaskRelation::BrandMember => !from.creator_may_set(to),
    };
    if !permitted {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Not allowed to move this task from '{from}' to '{to}'"
        ))));
    }

    let feedback = match input.feedback.as_deref().map(str::trim) {
        Some(_) if !relation.is_reviewer() => {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only reviewers may leave feedback".into(),
            )));
        }
        Some(text) if text.chars().count() > MAX_FEEDBACK_CHARS => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "feedback must be at most {MAX_FEEDBACK_CHARS} characters"
            ))));
        }
        other => other.filter(|t| !t.is_empty()),
    };

    let changes = WorkflowRepo::transition_task(
        &state.pool,
        &StatusChange::new(id, from, to, auth.user_id),
        feedback,
    )
    .await?;
    state
        .event_bus
        .publish_changes(&changes, auth.user_id, Audience::from(&owner));
    tracing::info!(task_id = %id, %from, %to, "Task status changed");

    let task = load_task(&state.pool, id).await?;
    Ok(DataResponse::new(task))
}

/// POST /api/tasks/{id}/uploads
///
/// Multipart upload of a deliverable (field `file`) by the task's
/// creator. Stored at `task-uploads/<task_id>/<file_name>`; a task in
/// `in_production` or `needs_edits` moves to `uploaded`.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadResult>>)> {
    let (owner, relation) = task_relation(&state.pool, &auth, id).await?;
    if relation != TaskRelation::Creator {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the task's creator may upload deliverables".into(),
        )));
    }
    let task = load_task(&state.pool, id).await?;

    let max_bytes = state.config.storage.max_upload_bytes as u64;
    let task_dir = state
        .config
        .storage
        .root
        .join(BUCKET_TASK_UPLOADS)
        .join(id.to_string());

    let mut stored: Option<(String, u64)> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if stored.is_some() {
            return Err(AppError::BadRequest("Only one file per upload".into()));
        }

        let file_name = sanitize_file_name(field.file_name().unwrap_or("upload.bin"))?;
        tokio::fs::create_dir_all(&task_dir)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;

        let final_path = task_dir.join(&file_name);
        let part_path = partial_path(&task_dir, &file_name);
        let mut file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let mut written: u64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    discard(&part_path).await;
                    return Err(AppError::BadRequest(e.to_string()));
                }
            };
            written += chunk.len() as u64;
            if written > max_bytes {
                discard(&part_path).await;
                return Err(AppError::Core(CoreError::Validation(format!(
                    "upload exceeds {max_bytes} bytes"
                ))));
            }
            if let Err(e) = file.write_all(&chunk).await {
                discard(&part_path).await;
                return Err(AppError::InternalError(e.to_string()));
            }
        }
        file.flush()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        drop(file);

        if written == 0 {
            discard(&part_path).await;
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }
        tokio::fs::rename(&part_path, &final_path)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        stored = Some((format!("{id}/{file_name}"), written));
    }

    let Some((path, size_bytes)) = stored else {
        return Err(AppError::BadRequest(format!(
            "Multipart field '{UPLOAD_FIELD}' is required"
        )));
    };

    let changes = WorkflowRepo::record_upload(&state.pool, &task, auth.user_id, &path).await?;
    state
        .event_bus
        .publish_changes(&changes, auth.user_id, Audience::from(&owner));
    tracing::info!(task_id = %id, %path, size_bytes, "Deliverable uploaded");

    let task = load_task(&state.pool, id).await?;
    Ok((
        StatusCode::CREATED,
        DataResponse::new(UploadResult {
            path,
            size_bytes,
            task,
        }),
    ))
}

fn partial_path(dir: &std::path::Path, file_name: &str) -> PathBuf {
    dir.join(format!(".{file_name}.{}.part", uuid::Uuid::new_v4().simple()))
}

async fn discard(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
    }
}
