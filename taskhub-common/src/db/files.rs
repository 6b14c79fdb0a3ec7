//! Uploaded file metadata persistence
//!
//! Only metadata lives here; the bytes are written by the server under the
//! uploads directory.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{is_foreign_key_violation, summary_cols, ts_col, uuid_col};
use crate::models::FileAttachment;
use crate::{time, Error, Result};

const FILE_COLUMNS: &str =
    "f.id, f.filename, f.filepath, f.filesize, f.mimetype, f.task_id, f.uploaded_by, f.created_at";

/// Metadata for a file that has already been written to disk
#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    pub filepath: String,
    pub filesize: i64,
    pub mimetype: String,
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
}

fn file_from_row(row: &SqliteRow, with_uploader: bool) -> Result<FileAttachment> {
    Ok(FileAttachment {
        id: uuid_col(row, "id")?,
        filename: row.try_get("filename")?,
        filepath: row.try_get("filepath")?,
        filesize: row.try_get("filesize")?,
        mimetype: row.try_get("mimetype")?,
        task_id: uuid_col(row, "task_id")?,
        uploaded_by: uuid_col(row, "uploaded_by")?,
        created_at: ts_col(row, "created_at")?,
        uploader: if with_uploader {
            summary_cols(row, "up")?
        } else {
            None
        },
    })
}

/// Record an uploaded file
///
/// Unknown task or uploader ids yield [`Error::InvalidInput`].
pub async fn insert_file(pool: &SqlitePool, file: &NewFile) -> Result<FileAttachment> {
    let record = FileAttachment {
        id: Uuid::new_v4(),
        filename: file.filename.clone(),
        filepath: file.filepath.clone(),
        filesize: file.filesize,
        mimetype: file.mimetype.clone(),
        task_id: file.task_id,
        uploaded_by: file.uploaded_by,
        created_at: time::now(),
        uploader: None,
    };

    sqlx::query(
        r#"
        INSERT INTO files (id, filename, filepath, filesize, mimetype, task_id, uploaded_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(&record.filename)
    .bind(&record.filepath)
    .bind(record.filesize)
    .bind(&record.mimetype)
    .bind(record.task_id.to_string())
    .bind(record.uploaded_by.to_string())
    .bind(time::to_db(&record.created_at))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            Error::InvalidInput("Unknown task or uploader".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    Ok(record)
}

/// Files of one task with uploader summaries, newest first
pub async fn list_files(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<FileAttachment>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {},
               u.id AS up_id, u.name AS up_name, u.email AS up_email, u.avatar AS up_avatar
        FROM files f
        LEFT JOIN users u ON u.id = f.uploaded_by
        WHERE f.task_id = ?
        ORDER BY f.created_at DESC, f.rowid DESC
        "#,
        FILE_COLUMNS
    ))
    .bind(task_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(|row| file_from_row(row, true)).collect()
}

/// Every file in upload order (no uploader join)
pub async fn list_all_files(pool: &SqlitePool) -> Result<Vec<FileAttachment>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM files f ORDER BY f.created_at ASC, f.rowid ASC",
        FILE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(|row| file_from_row(row, false)).collect()
}

/// Public paths of a task's files (used to clean up disk on task deletion)
pub async fn list_file_paths(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<String>> {
    let paths: Vec<String> = sqlx::query_scalar("SELECT filepath FROM files WHERE task_id = ?")
        .bind(task_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(paths)
}
