//! File uploads
//!
//! Bytes are written to `<uploads dir>/<uuid>[.<ext>]` and served back
//! under `/uploads/`. Only metadata goes into the database.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use taskhub_common::api::types::{FileListResponse, FileResponse};
use taskhub_common::db::{files, users};
use taskhub_common::TaskEvent;
use tracing::{info, warn};
use uuid::Uuid;

use super::tasks::require_task;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// The `file` part of the form
struct Upload {
    filename: String,
    mimetype: String,
    data: axum::body::Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File too large".to_string())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Name the stored file gets: a fresh UUID plus the original extension
///
/// The extension is whatever follows the last `.`, reduced to ASCII
/// alphanumerics so it can never introduce a path separator.
pub fn stored_filename(id: Uuid, original: &str) -> String {
    let ext: String = original
        .rsplit_once('.')
        .map(|(_, ext)| ext.chars().filter(char::is_ascii_alphanumeric).collect())
        .unwrap_or_default();

    if ext.is_empty() {
        id.to_string()
    } else {
        format!("{}.{}", id, ext)
    }
}

/// POST /api/tasks/:id/files
pub async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<FileResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut upload: Option<Upload> = None;
    let mut uploaded_by: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mimetype = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload {
                    filename,
                    mimetype,
                    data,
                });
            }
            Some("uploadedBy") => {
                uploaded_by = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    let uploaded_by = uploaded_by
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No uploader provided".to_string()))?;

    let task_id = require_task(&state, &id).await?;

    let uploader_id = Uuid::parse_str(&uploaded_by).ok();
    let uploader_id = match uploader_id {
        Some(uid) if users::user_exists(&state.db, uid).await? => uid,
        _ => return Err(ApiError::BadRequest("Unknown uploader".to_string())),
    };

    let unique = stored_filename(Uuid::new_v4(), &upload.filename);
    let disk_path = state.uploads_dir.join(&unique);
    tokio::fs::create_dir_all(state.uploads_dir.as_path()).await?;
    tokio::fs::write(&disk_path, &upload.data).await?;

    let new = files::NewFile {
        filename: upload.filename,
        filepath: format!("/uploads/{}", unique),
        filesize: upload.data.len() as i64,
        mimetype: upload.mimetype,
        task_id,
        uploaded_by: uploader_id,
    };

    let file = match files::insert_file(&state.db, &new).await {
        Ok(file) => file,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&disk_path).await {
                warn!("Failed to clean up {}: {}", disk_path.display(), rm);
            }
            return Err(e.into());
        }
    };
    info!(
        "Stored upload {} ({} bytes) for task {}",
        file.filepath, file.filesize, task_id
    );

    state.hub.publish_event(TaskEvent::FileUploaded(file.clone()));

    Ok(Json(FileResponse {
        message: "File uploaded successfully".to_string(),
        file,
    }))
}

/// GET /api/tasks/:id/files
pub async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FileListResponse>> {
    let task_id = require_task(&state, &id).await?;
    let files = files::list_files(&state.db, task_id).await?;
    Ok(Json(FileListResponse { files }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_filename_keeps_extension() {
        let id = Uuid::nil();
        assert_eq!(stored_filename(id, "report.final.pdf"), format!("{}.pdf", id));
        assert_eq!(stored_filename(id, "README"), id.to_string());
        assert_eq!(stored_filename(id, "trailing."), id.to_string());
        assert_eq!(stored_filename(id, "evil../x/hp"), format!("{}.xhp", id));
    }
}
