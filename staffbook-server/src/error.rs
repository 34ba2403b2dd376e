//! Unified service-layer error type
//!
//! `ServiceError` bridges storage errors (`DbError`, `StorageError`) and the
//! API-layer error (`AppError`), so managers can use `?` everywhere.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::DbError;
use crate::storage::StorageError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error, two variants:
///
/// - `Db`: infrastructure errors (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            // constraint fired despite the pre-checks
            DbError::Integrity(detail) => {
                tracing::warn!(detail = %detail, "Database integrity violation");
                ServiceError::App(AppError::integrity(detail))
            }
            DbError::Sqlx(e) => ServiceError::Db(e.into()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        tracing::error!(error = %e, "Object storage error");
        ServiceError::App(AppError::with_message(
            ErrorCode::FileStorageFailed,
            e.to_string(),
        ))
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Unwrap the business error, panicking on infrastructure errors (tests only)
#[cfg(test)]
pub(crate) fn app_error(e: ServiceError) -> AppError {
    match e {
        ServiceError::App(err) => err,
        ServiceError::Db(err) => panic!("unexpected infrastructure error: {err}"),
    }
}
