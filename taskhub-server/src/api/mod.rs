//! HTTP API handlers for taskhub-server

pub mod auth;
pub mod buildinfo;
pub mod comments;
pub mod files;
pub mod health;
pub mod sse;
pub mod tasks;
pub mod videos;
pub mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use auth::auth_routes;
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use sse::event_stream;
pub use ws::websocket_handler;

/// `/api/tasks` and everything nested under a task
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/tasks/:id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/tasks/:id/files",
            get(files::list_files).post(files::upload_file),
        )
        .route(
            "/api/tasks/:id/videos",
            get(videos::list_videos)
                .post(videos::create_video)
                .delete(videos::delete_video),
        )
}
