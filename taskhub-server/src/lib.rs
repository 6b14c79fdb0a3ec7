//! taskhub-server library - REST API and real-time fan-out
//!
//! Routes, shared state and the room hub live here so integration tests
//! can build the full router without binding a socket.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod extract;
pub mod realtime;

pub use error::{ApiError, ApiResult};
pub use realtime::RoomHub;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Real-time event hub
    pub hub: RoomHub,
    /// Directory holding uploaded files (served under `/uploads`)
    pub uploads_dir: Arc<PathBuf>,
    /// Request body cap for uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: SqlitePool, hub: RoomHub, uploads_dir: PathBuf, max_upload_bytes: usize) -> Self {
        Self {
            db,
            hub,
            uploads_dir: Arc::new(uploads_dir),
            max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let uploads = ServeDir::new(state.uploads_dir.as_path());
    let body_limit = state.max_upload_bytes;

    let api = Router::new()
        .merge(api::auth_routes())
        .merge(api::task_routes())
        .route("/api/events", get(api::event_stream))
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/ws", get(api::websocket_handler))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // UI may be served from another origin
        .layer(CorsLayer::permissive())
}
