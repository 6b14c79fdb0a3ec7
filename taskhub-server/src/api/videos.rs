//! YouTube video links

use axum::{
    extract::{Path, Query, State},
    Json,
};
use taskhub_common::api::types::{
    CreateVideoRequest, MessageResponse, VideoListResponse, VideoQuery, VideoResponse,
};
use taskhub_common::db::videos;
use taskhub_common::youtube::extract_youtube_id;
use taskhub_common::TaskEvent;
use tracing::info;
use uuid::Uuid;

use super::tasks::{parse_task_id, require_task};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::AppState;

const VIDEO_NOT_FOUND: &str = "Video not found";

/// POST /api/tasks/:id/videos
pub async fn create_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CreateVideoRequest>,
) -> ApiResult<Json<VideoResponse>> {
    let youtube_id = extract_youtube_id(&req.youtube_url)
        .ok_or_else(|| ApiError::BadRequest("Invalid YouTube URL".to_string()))?;
    let task_id = require_task(&state, &id).await?;

    let video = videos::insert_video(
        &state.db,
        &videos::NewVideo {
            title: req.title,
            youtube_url: req.youtube_url,
            youtube_id,
            description: req.description,
            task_id,
        },
    )
    .await?;
    info!("Video {} ({}) linked to task {}", video.id, video.youtube_id, task_id);

    state.hub.publish_event(TaskEvent::VideoAdded(video.clone()));

    Ok(Json(VideoResponse {
        message: "Video added successfully".to_string(),
        video,
    }))
}

/// GET /api/tasks/:id/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoListResponse>> {
    let task_id = require_task(&state, &id).await?;
    let videos = videos::list_videos(&state.db, task_id).await?;
    Ok(Json(VideoListResponse { videos }))
}

/// DELETE /api/tasks/:id/videos?videoId=<id>
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<MessageResponse>> {
    let video_id = query
        .video_id
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Video ID is required".to_string()))?;

    let task_id = parse_task_id(&id)?;
    let video_id = Uuid::parse_str(&video_id)
        .map_err(|_| ApiError::NotFound(VIDEO_NOT_FOUND.to_string()))?;

    if !videos::delete_video(&state.db, task_id, video_id).await? {
        return Err(ApiError::NotFound(VIDEO_NOT_FOUND.to_string()));
    }
    info!("Video {} removed from task {}", video_id, task_id);

    Ok(Json(MessageResponse {
        message: "Video deleted successfully".to_string(),
    }))
}
