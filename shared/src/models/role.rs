//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// System role (flat set, no inheritance between roles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Role {
    Employee,
    HrAdmin,
    SystemAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Employee, Role::HrAdmin, Role::SystemAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::HrAdmin => "HR_ADMIN",
            Role::SystemAdmin => "SYSTEM_ADMIN",
        }
    }

    /// HR_ADMIN or SYSTEM_ADMIN
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::HrAdmin | Role::SystemAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
