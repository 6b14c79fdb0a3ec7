//! Task persistence
//!
//! Detail queries assemble a task with its author, files, videos and
//! comments. Listing loads each child table once and groups in memory
//! rather than issuing one query per task.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use super::{comments, files, videos};
use super::{is_foreign_key_violation, opt_ts_col, summary_cols, ts_col, uuid_col};
use crate::models::{Task, TaskDetail, TaskPriority, TaskStatus, UserSummary};
use crate::{time, Error, Result};

const SELECT_WITH_AUTHOR: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
           t.author_id, t.created_at, t.updated_at,
           u.id AS au_id, u.name AS au_name, u.email AS au_email, u.avatar AS au_avatar
    FROM tasks t
    LEFT JOIN users u ON u.id = t.author_id
"#;

/// Validated task ready for insertion
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub author_id: Uuid,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Bare task columns
fn task_cols(row: &SqliteRow) -> Result<Task> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;

    Ok(Task {
        id: uuid_col(row, "id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: status
            .parse()
            .map_err(|_| Error::CorruptRecord(format!("task status {:?}", status)))?,
        priority: priority
            .parse()
            .map_err(|_| Error::CorruptRecord(format!("task priority {:?}", priority)))?,
        due_date: opt_ts_col(row, "due_date")?,
        author_id: uuid_col(row, "author_id")?,
        created_at: ts_col(row, "created_at")?,
        updated_at: ts_col(row, "updated_at")?,
    })
}

fn task_from_row(row: &SqliteRow) -> Result<(Task, Option<UserSummary>)> {
    Ok((task_cols(row)?, summary_cols(row, "au")?))
}

/// Insert a task
///
/// An unknown author id yields [`Error::InvalidInput`].
pub async fn insert_task(pool: &SqlitePool, new: &NewTask) -> Result<Task> {
    let now = time::now();
    let task = Task {
        id: Uuid::new_v4(),
        title: new.title.clone(),
        description: new.description.clone(),
        status: new.status,
        priority: new.priority,
        due_date: new.due_date,
        author_id: new.author_id,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO tasks (id, title, description, status, priority, due_date, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.id.to_string())
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(task.due_date.as_ref().map(time::to_db))
    .bind(task.author_id.to_string())
    .bind(time::to_db(&task.created_at))
    .bind(time::to_db(&task.updated_at))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            Error::InvalidInput("Unknown author".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    Ok(task)
}

/// Check whether a task id exists
pub async fn task_exists(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Load a task with author, files, videos and comments
pub async fn get_task_detail(pool: &SqlitePool, id: Uuid) -> Result<Option<TaskDetail>> {
    let row = sqlx::query(&format!("{} WHERE t.id = ?", SELECT_WITH_AUTHOR))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let (task, author) = task_from_row(&row)?;

    let mut task_files = files::list_files(pool, id).await?;
    for file in &mut task_files {
        file.uploader = None;
    }
    task_files.reverse();

    let mut task_videos = videos::list_videos(pool, id).await?;
    task_videos.reverse();

    Ok(Some(TaskDetail {
        task,
        author,
        files: task_files,
        videos: task_videos,
        comments: comments::list_comments(pool, id).await?,
    }))
}

/// Every task with details, newest first
pub async fn list_task_details(pool: &SqlitePool) -> Result<Vec<TaskDetail>> {
    let rows = sqlx::query(&format!(
        "{} ORDER BY t.created_at DESC, t.rowid DESC",
        SELECT_WITH_AUTHOR
    ))
    .fetch_all(pool)
    .await?;

    let mut files_by_task: HashMap<Uuid, Vec<_>> = HashMap::new();
    for file in files::list_all_files(pool).await? {
        files_by_task.entry(file.task_id).or_default().push(file);
    }

    let mut videos_by_task: HashMap<Uuid, Vec<_>> = HashMap::new();
    for video in videos::list_all_videos(pool).await? {
        videos_by_task.entry(video.task_id).or_default().push(video);
    }

    let mut comments_by_task: HashMap<Uuid, Vec<_>> = HashMap::new();
    for comment in comments::list_all_comments(pool).await? {
        comments_by_task.entry(comment.task_id).or_default().push(comment);
    }

    rows.iter()
        .map(|row| {
            let (task, author) = task_from_row(row)?;
            let id = task.id;
            Ok(TaskDetail {
                task,
                author,
                files: files_by_task.remove(&id).unwrap_or_default(),
                videos: videos_by_task.remove(&id).unwrap_or_default(),
                comments: comments_by_task.remove(&id).unwrap_or_default(),
            })
        })
        .collect()
}

/// Apply a partial update in a single statement
///
/// Returns `None` when the task does not exist.
pub async fn update_task(pool: &SqlitePool, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>> {
    let (due_date_set, due_date) = match &patch.due_date {
        Some(due) => (true, due.as_ref().map(time::to_db)),
        None => (false, None),
    };

    let row = sqlx::query(
        r#"
        UPDATE tasks
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            status = COALESCE(?, status),
            priority = COALESCE(?, priority),
            due_date = CASE WHEN ? THEN ? ELSE due_date END,
            updated_at = ?
        WHERE id = ?
        RETURNING id, title, description, status, priority, due_date,
                  author_id, created_at, updated_at
        "#,
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.status.map(|s| s.as_str()))
    .bind(patch.priority.map(|p| p.as_str()))
    .bind(due_date_set)
    .bind(due_date)
    .bind(time::to_db(&time::now()))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(task_cols).transpose()
}

/// Delete a task (children cascade)
///
/// Returns false when the task does not exist.
pub async fn delete_task(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
