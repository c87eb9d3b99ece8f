use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use yamdb_core::error::CoreError;
use yamdb_model::ValidationErrors;

pub const NOT_FOUND: &str = "Not found.";
pub const INVALID_PAGE: &str = "Invalid page.";
pub const INVALID_TOKEN: &str = "Given token not valid for any token type";
pub const SERVER_ERROR: &str = "A server error occurred.";

pub type AppResult<T> = Result<T, AppError>;

/// Error response. Field errors serialize as `{field: [messages]}`, all
/// other failures as `{"detail": message}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub detail: String,
    pub fields: Option<ValidationErrors>,
}

impl AppError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            fields: None,
        }
    }

    pub fn validation(fields: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: fields.to_string(),
            fields: Some(fields),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method \"{method}\" not allowed."),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.fields {
            Some(fields) => (self.status, Json(fields)).into_response(),
            None => (self.status, Json(json!({ "detail": self.detail }))).into_response(),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        if let Some(fields) = err.field_errors() {
            return Self::validation(fields);
        }
        match err {
            CoreError::NotFound(message) => Self::not_found(message),
            CoreError::Unauthenticated(message) => Self::unauthorized(message),
            CoreError::Forbidden(message) => Self::forbidden(message),
            CoreError::InvalidToken(reason) => {
                tracing::debug!(%reason, "rejected bearer token");
                Self::unauthorized(INVALID_TOKEN)
            }
            CoreError::Database(err) => {
                tracing::error!(error = ?err, "database operation failed");
                Self::internal(SERVER_ERROR)
            }
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal(SERVER_ERROR)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported media type in request.",
            ),
            other => Self::bad_request(format!("JSON parse error - {}", other.body_text())),
        }
    }
}

/// Malformed ids in the path cannot name an existing object.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        Self::not_found(NOT_FOUND)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::internal(SERVER_ERROR)
    }
}
