//! Error types for the HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use newsdesk_common::error::{is_busy, is_unique_violation};

/// Body of every 500 response; details stay in the log
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed field validation (400)
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409), e.g. email already registered
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// newsdesk-common error
    #[error(transparent)]
    Common(#[from] newsdesk_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 401 with the standard message for bad or missing tokens
    pub fn invalid_token() -> Self {
        ApiError::Unauthorized("Invalid or missing authentication token".to_string())
    }

    pub fn insufficient_permissions() -> Self {
        ApiError::Forbidden("Insufficient permissions".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use newsdesk_common::Error as CommonError;

        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
                    .into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Database(ref err) | ApiError::Common(CommonError::Database(ref err))
                if is_unique_violation(err) =>
            {
                (StatusCode::CONFLICT, "Resource already exists".to_string())
            }
            ApiError::Database(ref err) | ApiError::Common(CommonError::Database(ref err))
                if is_busy(err) =>
            {
                warn!("Database busy: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database is busy, please retry".to_string(),
                )
            }
            ApiError::Common(CommonError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            ApiError::Common(CommonError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let response = ApiError::Validation(vec![
            FieldError::new("email", "Invalid email"),
            FieldError::new("password", "Password must be at least 6 characters"),
        ])
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["field"], "email");
        assert_eq!(body["errors"][1]["message"], "Password must be at least 6 characters");
    }

    #[tokio::test]
    async fn test_common_errors_map_to_status() {
        let response =
            ApiError::from(newsdesk_common::Error::NotFound("Article not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Article not found");

        let response =
            ApiError::from(newsdesk_common::Error::InvalidInput("Unknown role: X".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = ApiError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], INTERNAL_ERROR_MESSAGE);

        let response = ApiError::Internal("Article 42 vanished after insert".into()).into_response();
        assert_eq!(body_json(response).await["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_forbidden_message() {
        let response = ApiError::insufficient_permissions().into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "Insufficient permissions");
    }
}
