//! User Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use super::skill::Skill;
use crate::serde_helpers;

/// Self-reported availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "employee_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Vacation,
    Sick,
    Remote,
    Trip,
}

/// User row (carries the password hash, never serialized to clients)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub position: Option<String>,
    pub department_id: Option<Uuid>,
    pub role: Role,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub mattermost: Option<String>,
    pub bio: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub employee_status: Option<EmployeeStatus>,
    pub current_avatar_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Values for a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// User as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: Option<String>,
    pub department_id: Option<Uuid>,
    pub role: Role,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub mattermost: Option<String>,
    pub bio: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub employee_status: Option<EmployeeStatus>,
    pub current_avatar_id: Option<Uuid>,
    pub photo_url: Option<String>,
    pub skills: Vec<Skill>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Compact user reference embedded in department views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            position: user.position.clone(),
        }
    }
}

/// Fields a user may edit on their own profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSelfUpdate {
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub mattermost: Option<String>,
    pub employee_status: Option<EmployeeStatus>,
    pub bio: Option<String>,
}

/// Fields an administrator may edit on any profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAdminUpdate {
    #[serde(flatten)]
    pub profile: UserSelfUpdate,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    pub department_id: Option<Option<Uuid>>,
    pub role: Option<Role>,
    pub city: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Replace a user's skill set by skill names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSkillsRequest {
    pub skills: Vec<String>,
}

/// Fuzzy search with optional filters (all filters AND together)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::comma_list")]
    pub cities: Vec<String>,
    #[serde(default, deserialize_with = "serde_helpers::comma_list")]
    pub departments: Vec<Uuid>,
    #[serde(default, deserialize_with = "serde_helpers::comma_list")]
    pub legal_entities: Vec<Uuid>,
    /// Every listed skill must be present on the user
    #[serde(default, deserialize_with = "serde_helpers::comma_list")]
    pub skills: Vec<String>,
}

/// Distinct values offered by the search UI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub positions: Vec<String>,
    pub skills: Vec<String>,
    pub legal_entities: Vec<String>,
    pub departments: Vec<String>,
}
