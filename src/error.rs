use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::AuthError, repository::RepositoryError, storage::StorageError};

/// ApiError
///
/// Every failure a handler can surface. Rendered as the uniform error envelope with the
/// matching HTTP status. Internal variants keep their cause for logging only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Token(#[from] AuthError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// ErrorBody
///
/// Wire shape of a failed request. Mirrors `ApiResponse` so clients can branch on `success`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub data: Option<()>,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Repository(RepositoryError::Duplicate(_)) => StatusCode::CONFLICT,
            ApiError::Token(AuthError::Invalid(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_)
            | ApiError::Repository(_)
            | ApiError::Storage(_)
            | ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client. Server-side causes are replaced by a generic text.
    fn public_message(&self) -> String {
        match self {
            ApiError::Repository(RepositoryError::Duplicate(what)) => {
                format!("{} already exists", what)
            }
            ApiError::Token(AuthError::Invalid(_)) => "Invalid token".to_string(),
            ApiError::Repository(_) | ApiError::Storage(_) | ApiError::Token(_) => {
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let message = self.public_message();
        let body = ErrorBody {
            status_code: status.as_u16(),
            data: None,
            errors: vec![message.clone()],
            message,
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// parse_id
///
/// Validates a path identifier before any database access. `resource` names the entity
/// in the error message, e.g. "invalid video id".
pub fn parse_id(raw: &str, resource: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid {} id", resource)))
}

/// Trims a required text field, rejecting blank values.
pub fn required_text(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}
