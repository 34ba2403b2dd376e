//! Skill Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Skill entity (name unique ignoring case)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create skill payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCreate {
    pub name: String,
}

/// Update skill payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillUpdate {
    pub name: String,
}
