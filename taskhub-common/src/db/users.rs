//! User persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{is_unique_violation, ts_col, uuid_col};
use crate::models::User;
use crate::{time, Error, Result};

const USER_COLUMNS: &str = "id, email, name, avatar, bio, created_at, updated_at";

/// User row together with the stored password hash (for login only)
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: uuid_col(row, "id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        avatar: row.try_get("avatar")?,
        bio: row.try_get("bio")?,
        created_at: ts_col(row, "created_at")?,
        updated_at: ts_col(row, "updated_at")?,
    })
}

/// Insert a new user
///
/// Returns [`Error::Conflict`] when the email is already registered.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
) -> Result<User> {
    let now = time::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: name.map(str::to_string),
        avatar: None,
        bio: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, name, avatar, bio, created_at, updated_at)
        VALUES (?, ?, ?, ?, NULL, NULL, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(password_hash)
    .bind(&user.name)
    .bind(time::to_db(&now))
    .bind(time::to_db(&now))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict("Email already registered".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    Ok(user)
}

/// Check whether a user id exists
pub async fn user_exists(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Check whether an email is already registered
pub async fn email_registered(pool: &SqlitePool, email: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Load a user and password hash by email
pub async fn find_credentials(pool: &SqlitePool, email: &str) -> Result<Option<StoredCredentials>> {
    let row = sqlx::query(&format!(
        "SELECT {}, password_hash FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(StoredCredentials {
            user: user_from_row(&row)?,
            password_hash: row.try_get("password_hash")?,
        })),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_load_user() {
        let pool = setup_test_db().await;

        let user = create_user(&pool, "ana@example.com", "hash", Some("ana"))
            .await
            .unwrap();

        let loaded = find_credentials(&pool, "ana@example.com").await.unwrap().unwrap();
        assert_eq!(loaded.user, user);
        assert!(user_exists(&pool, user.id).await.unwrap());
        assert!(email_registered(&pool, "ana@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = setup_test_db().await;
        create_user(&pool, "ana@example.com", "hash", None).await.unwrap();

        let result = create_user(&pool, "ana@example.com", "other", None).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_credentials() {
        let pool = setup_test_db().await;
        let user = create_user(&pool, "ben@example.com", "phc-string", None)
            .await
            .unwrap();

        let creds = find_credentials(&pool, "ben@example.com").await.unwrap().unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "phc-string");

        assert!(find_credentials(&pool, "nobody@example.com").await.unwrap().is_none());
    }
}
