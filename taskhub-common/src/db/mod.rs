//! Database initialization, migrations and queries
//!
//! Ids are stored as UUID strings and timestamps as fixed-width RFC 3339
//! strings (see [`crate::time`]).

pub mod comments;
pub mod files;
pub mod init;
pub mod migrations;
pub mod tasks;
pub mod users;
pub mod videos;

pub use init::init_database;
pub use migrations::run_migrations;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::models::UserSummary;
use crate::{time, Error, Result};

pub(crate) fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| Error::CorruptRecord(format!("{} {:?}: {}", column, raw, e)))
}

pub(crate) fn ts_col(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    time::from_db(&raw)
}

pub(crate) fn opt_ts_col(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.as_deref().map(time::from_db).transpose()
}

/// Read a `UserSummary` joined in as `<prefix>_id`, `<prefix>_name`, ...
///
/// Returns `None` when the joined user row is absent.
pub(crate) fn summary_cols(row: &SqliteRow, prefix: &str) -> Result<Option<UserSummary>> {
    let id: Option<String> = row.try_get(format!("{}_id", prefix).as_str())?;
    let Some(id) = id else {
        return Ok(None);
    };

    Ok(Some(UserSummary {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::CorruptRecord(format!("{}_id {:?}: {}", prefix, id, e)))?,
        name: row.try_get(format!("{}_name", prefix).as_str())?,
        email: row.try_get(format!("{}_email", prefix).as_str())?,
        avatar: row.try_get(format!("{}_avatar", prefix).as_str())?,
    }))
}

/// True when a sqlx error is a foreign key constraint failure
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_foreign_key_violation())
        .unwrap_or(false)
}

/// True when a sqlx error is a UNIQUE constraint failure
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}
