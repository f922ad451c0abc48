use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::forms::FieldErrors;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    NotFound(String),
    Internal(String),
    /// Empty or malformed mutation input; carries per-field messages.
    Validation(FieldErrors),
    /// Caller must authenticate first; carries the return path.
    Unauthenticated(String),
    /// Caller is identified but not allowed; carries the neutral view to land on.
    Forbidden(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation error: {}", errors),
            AppError::Unauthenticated(next) => write!(f, "Unauthenticated: login required for {}", next),
            AppError::Forbidden(location) => write!(f, "Forbidden: redirected to {}", location),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                internal_error()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_error()
            }
            AppError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, &msg),
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "errors": errors,
                    "status": StatusCode::UNPROCESSABLE_ENTITY.as_u16()
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            // Not errors to the HTTP caller: both surface as redirects, per
            // the original flow (login gate, non-author edit attempt).
            AppError::Unauthenticated(next) => {
                Redirect::to(&format!("/auth/login?next={}", next)).into_response()
            }
            AppError::Forbidden(location) => Redirect::to(&location).into_response(),
        }
    }
}

fn internal_error() -> Response {
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn error_body(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "status": status.as_u16()
    }));
    (status, body).into_response()
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

pub type AppResult<T> = Result<T, AppError>;
