//! YouTube video link persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{is_foreign_key_violation, ts_col, uuid_col};
use crate::models::Video;
use crate::{time, Error, Result};

const VIDEO_COLUMNS: &str =
    "id, title, youtube_url, youtube_id, description, task_id, created_at";

/// Validated video link ready for insertion
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub youtube_url: String,
    pub youtube_id: String,
    pub description: Option<String>,
    pub task_id: Uuid,
}

fn video_from_row(row: &SqliteRow) -> Result<Video> {
    Ok(Video {
        id: uuid_col(row, "id")?,
        title: row.try_get("title")?,
        youtube_url: row.try_get("youtube_url")?,
        youtube_id: row.try_get("youtube_id")?,
        description: row.try_get("description")?,
        task_id: uuid_col(row, "task_id")?,
        created_at: ts_col(row, "created_at")?,
    })
}

/// Insert a video link
pub async fn insert_video(pool: &SqlitePool, video: &NewVideo) -> Result<Video> {
    let record = Video {
        id: Uuid::new_v4(),
        title: video.title.clone(),
        youtube_url: video.youtube_url.clone(),
        youtube_id: video.youtube_id.clone(),
        description: video.description.clone(),
        task_id: video.task_id,
        created_at: time::now(),
    };

    sqlx::query(&format!(
        "INSERT INTO videos ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
        VIDEO_COLUMNS
    ))
    .bind(record.id.to_string())
    .bind(&record.title)
    .bind(&record.youtube_url)
    .bind(&record.youtube_id)
    .bind(&record.description)
    .bind(record.task_id.to_string())
    .bind(time::to_db(&record.created_at))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            Error::InvalidInput("Unknown task".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    Ok(record)
}

/// Videos of one task, newest first
pub async fn list_videos(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Video>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM videos WHERE task_id = ? ORDER BY created_at DESC, rowid DESC",
        VIDEO_COLUMNS
    ))
    .bind(task_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(video_from_row).collect()
}

/// Every video in insertion order
pub async fn list_all_videos(pool: &SqlitePool) -> Result<Vec<Video>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM videos ORDER BY created_at ASC, rowid ASC",
        VIDEO_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(video_from_row).collect()
}

/// Delete a video belonging to a task
///
/// Returns false when no such video exists on that task.
pub async fn delete_video(pool: &SqlitePool, task_id: Uuid, video_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM videos WHERE id = ? AND task_id = ?")
        .bind(video_id.to_string())
        .bind(task_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
