use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::types::errors::{AuthError, BookmarkError};

/// Single translation point from domain errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Bookmark(BookmarkError),
    Auth(AuthError),
    BadRequest(String),
    Internal(String),
}

impl From<BookmarkError> for ApiError {
    fn from(err: BookmarkError) -> Self {
        ApiError::Bookmark(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl ApiError {
    /// Status code and the message safe to show to the client.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
            ApiError::Bookmark(err) => match err {
                BookmarkError::InvalidUrl(_) | BookmarkError::InvalidIndex(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                BookmarkError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                BookmarkError::DownloadFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
                BookmarkError::DatabaseError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
            },
            ApiError::Auth(err) => match err {
                AuthError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, err.to_string()),
                AuthError::AuthorizationFailed(_) => {
                    (StatusCode::UNAUTHORIZED, "authorization failed".to_string())
                }
                AuthError::SigningFailed(_) | AuthError::DatabaseError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            let detail = match &self {
                ApiError::Bookmark(err) => err.to_string(),
                ApiError::Auth(err) => err.to_string(),
                ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg.clone(),
            };
            error!(status = status.as_u16(), error = %detail, "Request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
