//! Department Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;
use crate::serde_helpers;

/// Department entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub legal_entity_id: Uuid,
    pub parent_id: Option<Uuid>,
    /// Unique across departments: a user manages at most one
    pub manager_id: Option<Uuid>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create department payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentCreate {
    pub name: String,
    pub legal_entity_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Update department payload
///
/// `parent_id` and `manager_id` accept an explicit `null` to detach.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    pub parent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    pub manager_id: Option<Option<Uuid>>,
}

/// Department with its manager, employees and direct children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentView {
    #[serde(flatten)]
    pub department: Department,
    pub manager: Option<UserSummary>,
    pub employees: Vec<UserSummary>,
    pub subdepartments: Vec<Department>,
}
