//! API error type with IntoResponse
//!
//! Errors become `{"error": <kind>, "detail": <message>}` bodies with the matching status.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::EmployeeError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Rejected input, including unparseable bodies and query strings (400)
    Validation(String),

    /// Unknown employee (404)
    NotFound(String),

    /// Duplicate employee id (409)
    Conflict(String),

    /// Store failure (500, logged)
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            Self::Validation(detail) => (StatusCode::BAD_REQUEST, "validation_error", detail),
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, "not_found", detail),
            Self::Conflict(detail) => (StatusCode::CONFLICT, "conflict", detail),
            Self::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = self.parts();

        if let Self::Internal(detail) = &self {
            tracing::error!("Internal error: {}", detail);
        }

        let body = json!({
            "error": kind,
            "detail": detail,
        });

        (status, Json(body)).into_response()
    }
}

impl From<EmployeeError> for ApiError {
    fn from(e: EmployeeError) -> Self {
        let detail = e.to_string();

        match e {
            EmployeeError::Validation(_) => Self::Validation(detail),
            EmployeeError::NotFound(_) => Self::NotFound(detail),
            EmployeeError::Conflict(_) => Self::Conflict(detail),
            EmployeeError::Internal(_) => Self::Internal(detail),
        }
    }
}
