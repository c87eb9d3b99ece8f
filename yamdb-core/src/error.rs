use thiserror::Error;
use yamdb_model::{ModelError, ValidationErrors};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A uniqueness rule was violated; reported against `field`.
    #[error("conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found() -> Self {
        CoreError::NotFound("Not found.".to_string())
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(ValidationErrors::single(field, message))
    }

    /// Field errors for validation failures and uniqueness conflicts alike.
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            CoreError::Validation(errors) => Some(errors.clone()),
            CoreError::Conflict { field, message } => {
                Some(ValidationErrors::single(field.clone(), message.clone()))
            }
            _ => None,
        }
    }
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(errors) => CoreError::Validation(errors),
        }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
