//! Task CRUD
//!
//! Mutations publish to the room hub after the database write succeeds:
//! creation and deletion reach every client, updates only the task room.

use axum::{
    extract::{Path, State},
    Json,
};
use std::path::Path as FsPath;
use taskhub_common::api::types::{
    CreateTaskRequest, MessageResponse, TaskListResponse, TaskResponse, UpdateTaskRequest,
};
use taskhub_common::db::{files, tasks};
use taskhub_common::TaskEvent;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::AppState;

pub(crate) const TASK_NOT_FOUND: &str = "Task not found";

/// Parse a task id from the path; a malformed id cannot name a task
pub(crate) fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(TASK_NOT_FOUND.to_string()))
}

/// 404 unless the task exists
pub(crate) async fn require_task(state: &AppState, raw: &str) -> ApiResult<Uuid> {
    let id = parse_task_id(raw)?;
    if tasks::task_exists(&state.db, id).await? {
        Ok(id)
    } else {
        Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()))
    }
}

async fn load_detail(state: &AppState, id: Uuid) -> ApiResult<taskhub_common::models::TaskDetail> {
    tasks::get_task_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))
}

/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<TaskListResponse>> {
    let tasks = tasks::list_task_details(&state.db).await?;
    Ok(Json(TaskListResponse { tasks }))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let new = tasks::NewTask {
        due_date: req.due_date()?,
        title: req.title,
        description: req.description,
        status: req.status.unwrap_or_default(),
        priority: req.priority.unwrap_or_default(),
        author_id: req.author_id,
    };

    let task = tasks::insert_task(&state.db, &new).await?;
    let detail = load_detail(&state, task.id).await?;
    info!("Created task {} \"{}\"", task.id, task.title);

    state.hub.publish_event(TaskEvent::TaskCreated(detail.clone()));

    Ok(Json(TaskResponse {
        message: Some("Task created successfully".to_string()),
        task: detail,
    }))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;
    let detail = load_detail(&state, id).await?;

    Ok(Json(TaskResponse {
        message: None,
        task: detail,
    }))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;
    let patch = tasks::TaskPatch {
        due_date: req.due_date_change()?,
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
    };

    if tasks::update_task(&state.db, id, &patch).await?.is_none() {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }
    let detail = load_detail(&state, id).await?;
    info!("Updated task {}", id);

    state.hub.publish_event(TaskEvent::TaskUpdated(detail.clone()));

    Ok(Json(TaskResponse {
        message: Some("Task updated successfully".to_string()),
        task: detail,
    }))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_task_id(&id)?;

    // Collect paths before the rows cascade away
    let stored = files::list_file_paths(&state.db, id).await?;

    if !tasks::delete_task(&state.db, id).await? {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }
    info!("Deleted task {}", id);

    for filepath in stored {
        remove_upload(&state.uploads_dir, &filepath).await;
    }

    state.hub.publish_event(TaskEvent::TaskDeleted(id));

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Best-effort removal of a stored upload given its public `/uploads/<name>` path
async fn remove_upload(uploads_dir: &FsPath, filepath: &str) {
    let Some(name) = FsPath::new(filepath).file_name() else {
        warn!("Skipping malformed upload path {:?}", filepath);
        return;
    };

    let path = uploads_dir.join(name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove upload {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(matches!(parse_task_id("nope"), Err(ApiError::NotFound(_))));
        assert!(parse_task_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[tokio::test]
    async fn test_remove_upload_only_touches_uploads_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("abc.txt");
        tokio::fs::write(&stored, b"hi").await.unwrap();

        remove_upload(dir.path(), "/uploads/abc.txt").await;
        assert!(!stored.exists());

        // Missing files are logged, not fatal
        remove_upload(dir.path(), "/uploads/missing.txt").await;
    }
}
