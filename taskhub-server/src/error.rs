//! Error types for taskhub-server
//!
//! Every failing handler answers with `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use taskhub_common::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("{0}")]
    Conflict(String),

    /// Upload exceeds the configured body limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<taskhub_common::Error> for ApiError {
    fn from(err: taskhub_common::Error) -> Self {
        use taskhub_common::Error;

        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        error!("I/O failure: {}", err);
        ApiError::Internal("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_status() {
        let cases = [
            (taskhub_common::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (taskhub_common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (taskhub_common::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (taskhub_common::Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = ApiError::from(taskhub_common::Error::CorruptRecord("secret row".into()));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
