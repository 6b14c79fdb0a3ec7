//! Task comments

use axum::{
    extract::{Path, State},
    Json,
};
use taskhub_common::api::types::{CommentListResponse, CommentResponse, CreateCommentRequest};
use taskhub_common::db::comments;
use taskhub_common::TaskEvent;
use tracing::info;

use super::tasks::require_task;
use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::AppState;

/// POST /api/tasks/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    let task_id = require_task(&state, &id).await?;

    let comment = comments::insert_comment(&state.db, task_id, req.author_id, &req.content).await?;
    info!("Comment {} added to task {}", comment.id, task_id);

    state.hub.publish_event(TaskEvent::CommentAdded(comment.clone()));

    Ok(Json(CommentResponse {
        message: "Comment added successfully".to_string(),
        comment,
    }))
}

/// GET /api/tasks/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CommentListResponse>> {
    let task_id = require_task(&state, &id).await?;
    let comments = comments::list_comments(&state.db, task_id).await?;
    Ok(Json(CommentListResponse { comments }))
}
