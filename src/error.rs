//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every component raises one of its variants and lets it propagate with `?`; the
//! `ResponseError` implementation below is the single place where an error kind is
//! mapped to an HTTP status code and a response body.
//!
//! Failure bodies always have the shape
//! `{"status": "error", "message": ..., "errors": [{"field": ..., "message": ...}]}`,
//! where `errors` is only present for validation failures.
//!
//! `From` implementations exist for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `tokio::task::JoinError`.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::sync::OnceLock;
use validator::ValidationErrors;

/// Postgres' default name for the `tasks.project_id` foreign key.
const PROJECT_FK: &str = "tasks_project_id_fkey";

static EXPOSE_INTERNAL_ERRORS: OnceLock<bool> = OnceLock::new();

/// Controls whether 500 responses carry the underlying error message.
///
/// Called once at startup; later calls are ignored. Until it is called,
/// internal error details are suppressed.
pub fn expose_internal_errors(enabled: bool) {
    let _ = EXPOSE_INTERNAL_ERRORS.set(enabled);
}

fn internal_errors_exposed() -> bool {
    EXPOSE_INTERNAL_ERRORS.get().copied().unwrap_or(false)
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Input failed validation (HTTP 400). Carries the field-level breakdown.
    ValidationError {
        message: String,
        errors: Vec<FieldError>,
    },
    /// Malformed request that never reached validation (HTTP 400), e.g. a body
    /// that is not valid JSON or a path id that is not a UUID.
    BadRequest(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// The caller is authenticated but does not own the resource (HTTP 403).
    Forbidden(String),
    /// No resource with the requested id exists (HTTP 404).
    NotFound(String),
    /// A unique field is already taken (HTTP 409).
    Conflict(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Represents an error originating from database operations (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Builds a validation error for a single field.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        AppError::ValidationError {
            message: "Validation Error".into(),
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::ValidationError { message, .. }
            | AppError::BadRequest(message)
            | AppError::Unauthorized(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::InternalServerError(message)
            | AppError::DatabaseError(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError { message, errors } => {
                write!(f, "Validation Error: {}", message)?;
                for error in errors {
                    write!(f, "; {}: {}", error.field, error.message)?;
                }
                Ok(())
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::ValidationError { message, errors } => {
                HttpResponse::build(status).json(json!({
                    "status": "error",
                    "message": message,
                    "errors": errors,
                }))
            }
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                log::error!("{}", self);
                let message = if internal_errors_exposed() {
                    self.message()
                } else {
                    "Internal Server Error"
                };
                HttpResponse::build(status).json(json!({
                    "status": "error",
                    "message": message,
                }))
            }
            _ => HttpResponse::build(status).json(json!({
                "status": "error",
                "message": self.message(),
            })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, a Postgres unique violation (`23505`)
/// becomes `Conflict`, a foreign key violation (`23503`) becomes `NotFound`
/// for the referenced record, everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                AppError::Conflict("A record with this value already exists".into())
            }
            // A task write racing a project delete.
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23503") => {
                match db.constraint() {
                    Some(PROJECT_FK) => AppError::NotFound("Project not found".into()),
                    _ => AppError::NotFound("Referenced record not found".into()),
                }
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(format!("Migration failed: {}", error))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`,
/// flattening nested field errors into a list sorted by field name.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        let mut errors: Vec<FieldError> = error
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError {
            message: "Validation Error".into(),
            errors,
        }
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
///
/// Expiry keeps its own message so clients can tell a stale session from a
/// forged or mangled token.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired".into()),
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AppError::Unauthorized("Invalid token".into()),
            _ => AppError::Unauthorized("Token verification failed".into()),
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// A blocking task (password hashing) panicked or was cancelled.
impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> AppError {
        AppError::InternalServerError(format!("Background task failed: {}", error))
    }
}
