//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler, service, or store can produce is expressed as one of its
//! variants, and each variant maps to exactly one HTTP status.
//!
//! `AppError` implements `actix_web::error::ResponseError`, rendering every error as the
//! same JSON envelope: `{timestamp, status, message, errors?}`. It also provides `From`
//! implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, and `bcrypt::BcryptError`, so the `?` operator works
//! across layers.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidationErrors;

/// PostgreSQL error code for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// The resource does not exist or belongs to someone else (HTTP 404).
    /// Both cases carry the same message so callers cannot probe for other users' tasks.
    NotFound(String),
    /// The request collides with existing state, e.g. a duplicate email (HTTP 409).
    Conflict(String),
    /// Bad credentials or a missing/invalid token (HTTP 401).
    Unauthorized(String),
    /// Field-level validation failed (HTTP 400). Maps field name to message.
    ValidationFailed(BTreeMap<String, String>),
    /// The request could not be parsed at all (HTTP 400).
    BadRequest(String),
    /// An illegal internal state, such as a token whose subject has no user record (HTTP 500).
    InternalFault(String),
    /// Any other error from the store (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    pub fn task_not_found(id: impl fmt::Display) -> Self {
        AppError::NotFound(format!("Task not found with id: {}", id))
    }

    pub fn user_not_found(email: &str) -> Self {
        AppError::NotFound(format!("User not found with email: {}", email))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ValidationFailed(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InternalFault(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message exposed to clients. Store errors are deliberately generic.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) => {
                msg.clone()
            }
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::ValidationFailed(_) => "Validation failed".to_string(),
            AppError::InternalFault(msg) => {
                format!("An unexpected internal error occurred: {}", msg)
            }
            AppError::DatabaseError(_) => "An unexpected internal error occurred".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::ValidationFailed(errors) => write!(f, "Validation Failed: {:?}", errors),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::InternalFault(msg) => write!(f, "Internal Fault: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// The uniform JSON body returned for every error.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub timestamp: i64,
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Client errors are logged at warn level, server errors at error level.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = AppError::status_code(self);
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }

        let errors = match self {
            AppError::ValidationFailed(fields) => Some(fields.clone()),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorEnvelope {
            timestamp: Utc::now().timestamp_millis(),
            status: status.as_u16(),
            message: self.public_message(),
            errors,
        })
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, a unique-constraint violation becomes `Conflict`,
/// anything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) => {
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationFailed`.
///
/// Each field keeps its messages; several failures on one field are joined with `"; "`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        let fields = error
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("Validation failed: {}", e.code),
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                (field.to_string(), message)
            })
            .collect();
        AppError::ValidationFailed(fields)
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalFault`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalFault(error.to_string())
    }
}
