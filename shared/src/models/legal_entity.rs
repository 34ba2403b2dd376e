//! Legal Entity Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Legal entity (owner of departments)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LegalEntity {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create legal entity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalEntityCreate {
    pub name: String,
}

/// Update legal entity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalEntityUpdate {
    pub name: String,
}
