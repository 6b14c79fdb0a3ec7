//! Registration and login
//!
//! There are no sessions or tokens: a successful login simply returns
//! the user record, which clients keep as their identity.

use axum::{extract::State, routing::post, Json, Router};
use taskhub_common::api::types::{LoginRequest, RegisterRequest, UserResponse};
use taskhub_common::db::users;
use taskhub_common::{password, Error};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const EMAIL_TAKEN: &str = "Email already registered";

/// Run a CPU-heavy password operation off the async runtime
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> taskhub_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Password worker failed: {}", e)))?
        .map_err(ApiError::from)
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<Json<UserResponse>> {
    if users::email_registered(&state.db, &req.email).await? {
        return Err(ApiError::BadRequest(EMAIL_TAKEN.to_string()));
    }

    let plain = req.password.clone();
    let hash = blocking(move || password::hash_password(&plain)).await?;

    let user = users::create_user(&state.db, &req.email, &hash, Some(&req.display_name()))
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration
            Error::Conflict(_) => ApiError::BadRequest(EMAIL_TAKEN.to_string()),
            other => other.into(),
        })?;

    info!("Registered user {} ({})", user.id, user.email);

    Ok(Json(UserResponse {
        message: "User registered successfully".to_string(),
        user,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let Some(creds) = users::find_credentials(&state.db, &req.email).await? else {
        debug!("Login for unknown email {}", req.email);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let plain = req.password;
    let stored = creds.password_hash;
    if !blocking(move || password::verify_password(&plain, &stored)).await? {
        debug!("Wrong password for {}", req.email);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    info!("User {} logged in", creds.user.id);

    Ok(Json(UserResponse {
        message: "Login successful".to_string(),
        user: creds.user,
    }))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}
