//! Shared types for staffbook
//!
//! Error codes, the API response envelope, domain models and small
//! utilities used by the server and by API clients.

pub mod error;
pub mod models;
pub mod serde_helpers;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
