//! staffbook-server: employee directory backend
//!
//! - [`services`]: department hierarchy, avatar lifecycle and directory managers
//! - [`access`]: role-based access gate consulted by every manager
//! - [`db`]: transactional store (PostgreSQL, in-memory)
//! - [`storage`]: avatar blob storage (S3, in-memory)
//! - [`api`]: axum routes

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod health;
pub mod services;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
