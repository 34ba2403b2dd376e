//! Unified error system for staffbook
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`ErrorKind`]: Outcome classification that drives the HTTP status
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::DepartmentNotEmpty)
//!     .with_detail("subdepartments", 1)
//!     .with_detail("employees", 3);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(4006));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::{ErrorCategory, ErrorKind};
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError};
