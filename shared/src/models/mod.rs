//! Data models
//!
//! Shared between staffbook-server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUIDs; timestamps are Unix milliseconds.

pub mod auth;
pub mod avatar;
pub mod department;
pub mod legal_entity;
pub mod role;
pub mod skill;
pub mod user;

// Re-exports
pub use auth::*;
pub use avatar::*;
pub use department::*;
pub use legal_entity::*;
pub use role::*;
pub use skill::*;
pub use user::*;
