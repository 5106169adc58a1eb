//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can produce, from a missing bearer token to a duplicate
//! membership, is one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return it
//! directly. Authentication, not-found and bad-request failures render as
//! `{"error": "<message>"}`; validation failures render as a field-keyed mapping such as
//! `{"title": ["can't be blank"]}` with status 422.
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `TokenError` and `bcrypt::BcryptError` allow conversion with the `?` operator.

use std::collections::BTreeMap;
use std::fmt;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication token required";
pub const AUTH_INVALID_MESSAGE: &str = "Authentication failed";

pub const BLANK: &str = "can't be blank";
pub const MUST_EXIST: &str = "must exist";
pub const TAKEN: &str = "has already been taken";
pub const DEPENDENT_TASKS: &str = "Cannot delete record because dependent tasks exist";

/// Validation failures keyed by field name, each with one or more messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a mapping holding a single message.
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise `AppError::ValidationFailed`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self))
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            for error in list {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                fields.add(field, &message);
            }
        }
        fields
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{} {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// No bearer credential on a protected request (HTTP 401).
    AuthRequired,
    /// The credential failed signature, format or expiry checks, or its user is gone (HTTP 401).
    AuthInvalid,
    /// Any other unauthorized attempt, such as bad login credentials (HTTP 401).
    Unauthorized(String),
    /// Malformed request body or query (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Entity attribute constraints violated (HTTP 422).
    ValidationFailed(FieldErrors),
    /// Represents an error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::AuthRequired => write!(f, "Unauthorized: {}", AUTH_REQUIRED_MESSAGE),
            AppError::AuthInvalid => write!(f, "Unauthorized: {}", AUTH_INVALID_MESSAGE),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationFailed(errors) => write!(f, "Validation Error: {}", errors),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthRequired | AppError::AuthInvalid | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            AppError::AuthRequired => response.json(json!({ "error": AUTH_REQUIRED_MESSAGE })),
            AppError::AuthInvalid => response.json(json!({ "error": AUTH_INVALID_MESSAGE })),
            AppError::ValidationFailed(errors) => response.json(errors),
            // Database details stay in the server log.
            AppError::DatabaseError(_) => response.json(json!({ "error": "Database error" })),
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg) => response.json(json!({ "error": msg })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`; unique and foreign-key violations become
/// validation failures so a racing duplicate still surfaces as 422.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::ValidationFailed(FieldErrors::single("base", TAKEN))
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::ValidationFailed(FieldErrors::single(
                    "base",
                    "references a record that does not exist or is still referenced",
                ))
            }
            _ => {
                log::error!("database error: {}", error);
                AppError::DatabaseError(error.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationFailed(error.into())
    }
}

/// Any token decode failure is an authentication failure.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Encoding(msg) => {
                AppError::InternalServerError(format!("Failed to generate token: {}", msg))
            }
            _ => AppError::AuthInvalid,
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
