//! Comment persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{is_foreign_key_violation, summary_cols, ts_col, uuid_col};
use crate::models::Comment;
use crate::{time, Error, Result};

/// Comment columns joined with the author summary
const SELECT_WITH_AUTHOR: &str = r#"
    SELECT c.id, c.content, c.task_id, c.author_id, c.created_at,
           u.id AS au_id, u.name AS au_name, u.email AS au_email, u.avatar AS au_avatar
    FROM comments c
    LEFT JOIN users u ON u.id = c.author_id
"#;

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: uuid_col(row, "id")?,
        content: row.try_get("content")?,
        task_id: uuid_col(row, "task_id")?,
        author_id: uuid_col(row, "author_id")?,
        created_at: ts_col(row, "created_at")?,
        author: summary_cols(row, "au")?,
    })
}

/// Insert a comment and return it with its author summary
///
/// Unknown task or author ids yield [`Error::InvalidInput`].
pub async fn insert_comment(
    pool: &SqlitePool,
    task_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> Result<Comment> {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO comments (id, content, task_id, author_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(content)
    .bind(task_id.to_string())
    .bind(author_id.to_string())
    .bind(time::to_db(&time::now()))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            Error::InvalidInput("Unknown task or author".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    get_comment(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("comment {} vanished after insert", id)))
}

/// Load a comment by id
pub async fn get_comment(pool: &SqlitePool, id: Uuid) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE c.id = ?", SELECT_WITH_AUTHOR))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(comment_from_row).transpose()
}

/// Comments of one task, newest first
pub async fn list_comments(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!(
        "{} WHERE c.task_id = ? ORDER BY c.created_at DESC, c.rowid DESC",
        SELECT_WITH_AUTHOR
    ))
    .bind(task_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(comment_from_row).collect()
}

/// Every comment, newest first
pub async fn list_all_comments(pool: &SqlitePool) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!(
        "{} ORDER BY c.created_at DESC, c.rowid DESC",
        SELECT_WITH_AUTHOR
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(comment_from_row).collect()
}
