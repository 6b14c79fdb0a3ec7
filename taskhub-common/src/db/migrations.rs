//! Database schema migrations
//!
//! Versioned changes applied after the base schema is created. The applied
//! version is tracked in the `schema_version` table and every migration is
//! idempotent, so re-running against an up-to-date database is a no-op.
//!
//! Never modify an existing migration; add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: lookup indexes for per-task children and task listing
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: add task lookup indexes");

    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_comments_task_id ON comments(task_id)",
        "CREATE INDEX IF NOT EXISTS idx_files_task_id ON files(task_id)",
        "CREATE INDEX IF NOT EXISTS idx_videos_task_id ON videos(task_id)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        // Single connection: every in-memory connection is its own database
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn index_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_schema_version_no_table() {
        let pool = setup_test_db().await;
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_migrations_from_scratch() {
        let pool = setup_test_db().await;
        create_schema(&pool).await.unwrap();

        run_migrations(&pool).await.unwrap();

        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(index_count(&pool).await, 4);
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = setup_test_db().await;
        create_schema(&pool).await.unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_newer_schema_version_is_left_alone() {
        let pool = setup_test_db().await;
        create_schema(&pool).await.unwrap();
        set_schema_version(&pool, CURRENT_SCHEMA_VERSION + 5).await.unwrap();

        run_migrations(&pool).await.unwrap();

        assert_eq!(index_count(&pool).await, 0);
    }
}
