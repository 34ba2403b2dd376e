//! Business managers
//!
//! Each operation checks access, opens one transaction, validates before
//! writing and commits once. Handlers stay thin and call straight in here.

pub mod auth;
pub mod avatars;
pub mod departments;
pub mod filters;
pub mod legal_entities;
pub mod skills;
pub mod users;
