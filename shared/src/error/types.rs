//! `AppError` and the JSON envelope written for every failed request

use std::collections::HashMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::category::{ErrorCategory, ErrorKind};
use super::codes::ErrorCode;

/// A business or request error as seen by API clients.
///
/// `details` carries machine-readable context next to the message, e.g. the
/// subdepartment and employee counts of a department that cannot be deleted.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// A dependency (object storage, monitoring) is marked down
    pub fn service_unavailable(service: impl Into<String>) -> Self {
        let service = service.into();
        Self::with_message(
            ErrorCode::ServiceUnavailable,
            format!("{service} is temporarily unavailable"),
        )
        .with_detail("service", service)
    }

    /// A database constraint fired; `detail` is the constraint text
    pub fn integrity(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::with_message(ErrorCode::IntegrityViolation, detail.clone())
            .with_detail("detail", detail)
    }
}

/// Response envelope.
///
/// Failures always carry `code`, `kind` and `message`; `details` only when the
/// error has some. Delete endpoints answer with [`ApiResponse::ok`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            kind: None,
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            kind: Some(err.kind()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // 503s are expected while a monitor reports a dependency down
        if self.code.category() == ErrorCategory::System
            && self.kind() != ErrorKind::ServiceUnavailable
        {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (self.http_status(), axum::Json(ApiResponse::error(&self))).into_response()
    }
}
