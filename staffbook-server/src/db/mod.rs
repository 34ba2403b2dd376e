//! Persistence layer
//!
//! Managers talk to a [`Store`] and run every operation inside one
//! [`Transaction`]. Two backends exist:
//! - [`postgres::PgStore`]: production, sqlx over a `PgPool`
//! - [`memory::MemoryStore`]: in-process, used by tests and local runs
//!
//! A transaction that is dropped without [`Transaction::commit`] rolls back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared::models::{
    Avatar, Department, DepartmentCreate, DepartmentUpdate, LegalEntity, ModerationStatus,
    NewUser, SearchQuery, Skill, User, UserAdminUpdate,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage-level error
#[derive(Debug, Error)]
pub enum DbError {
    /// A unique / foreign-key / not-null / check constraint fired
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            use sqlx::error::ErrorKind;
            if matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                let detail = db_err
                    .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                    .and_then(|pg| pg.detail())
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                return DbError::Integrity(detail);
            }
        }
        DbError::Sqlx(e)
    }
}

/// Values for a new avatar row
#[derive(Debug, Clone)]
pub struct NewAvatar {
    pub user_id: Uuid,
    pub storage_key: String,
    pub status: ModerationStatus,
    pub moderated_by_id: Option<Uuid>,
}

/// Handle to a storage backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new transaction
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError>;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<(), DbError>;
}

/// One unit of work. Reads see the transaction's own writes.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(self: Box<Self>) -> Result<(), DbError>;

    // ========== Users ==========

    async fn user(&mut self, id: Uuid) -> Result<Option<User>, DbError>;
    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError>;
    async fn list_users(&mut self, active_only: bool) -> Result<Vec<User>, DbError>;
    async fn users_in_department(&mut self, department_id: Uuid) -> Result<Vec<User>, DbError>;
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, DbError>;
    /// Apply the `Some` fields; `None` when the user does not exist
    async fn update_user(
        &mut self,
        id: Uuid,
        changes: &UserAdminUpdate,
    ) -> Result<Option<User>, DbError>;
    async fn deactivate_user(&mut self, id: Uuid) -> Result<Option<User>, DbError>;
    /// Filtered users ordered by trigram similarity to `query.q`
    async fn search_users(&mut self, query: &SearchQuery) -> Result<Vec<User>, DbError>;
    async fn distinct_cities(&mut self) -> Result<Vec<String>, DbError>;
    async fn distinct_positions(&mut self) -> Result<Vec<String>, DbError>;
    /// `(user_id, skill)` pairs for the given users
    async fn skills_of(&mut self, user_ids: &[Uuid]) -> Result<Vec<(Uuid, Skill)>, DbError>;
    async fn set_user_skills(&mut self, user_id: Uuid, skill_ids: &[Uuid]) -> Result<(), DbError>;
    async fn set_current_avatar(
        &mut self,
        user_id: Uuid,
        avatar_id: Option<Uuid>,
    ) -> Result<(), DbError>;

    // ========== Departments ==========

    async fn department(&mut self, id: Uuid) -> Result<Option<Department>, DbError>;
    async fn department_by_name(&mut self, name: &str) -> Result<Option<Department>, DbError>;
    async fn list_departments(&mut self) -> Result<Vec<Department>, DbError>;
    async fn subdepartments(&mut self, parent_id: Uuid) -> Result<Vec<Department>, DbError>;
    /// The department `user_id` manages, if any
    async fn managed_department(&mut self, user_id: Uuid) -> Result<Option<Department>, DbError>;
    async fn insert_department(&mut self, dept: &DepartmentCreate) -> Result<Department, DbError>;
    async fn update_department(
        &mut self,
        id: Uuid,
        changes: &DepartmentUpdate,
    ) -> Result<Option<Department>, DbError>;
    async fn delete_department(&mut self, id: Uuid) -> Result<bool, DbError>;
    async fn count_subdepartments(&mut self, id: Uuid) -> Result<i64, DbError>;
    async fn count_employees(&mut self, id: Uuid) -> Result<i64, DbError>;
    /// Whether `ancestor` is reachable from `child` by following parent links.
    /// Reflexive: a department is its own descendant.
    async fn is_descendant(&mut self, child: Uuid, ancestor: Uuid) -> Result<bool, DbError>;

    // ========== Legal entities ==========

    async fn legal_entity(&mut self, id: Uuid) -> Result<Option<LegalEntity>, DbError>;
    async fn legal_entity_by_name(&mut self, name: &str)
    -> Result<Option<LegalEntity>, DbError>;
    async fn list_legal_entities(&mut self) -> Result<Vec<LegalEntity>, DbError>;
    async fn insert_legal_entity(&mut self, name: &str) -> Result<LegalEntity, DbError>;
    async fn rename_legal_entity(
        &mut self,
        id: Uuid,
        name: &str,
    ) -> Result<Option<LegalEntity>, DbError>;
    async fn delete_legal_entity(&mut self, id: Uuid) -> Result<bool, DbError>;
    async fn count_departments_of(&mut self, legal_entity_id: Uuid) -> Result<i64, DbError>;

    // ========== Skills ==========

    async fn skill(&mut self, id: Uuid) -> Result<Option<Skill>, DbError>;
    /// Case-insensitive lookup
    async fn skill_by_name(&mut self, name: &str) -> Result<Option<Skill>, DbError>;
    /// Case-insensitive lookup of many names; missing names are skipped
    async fn skills_by_names(&mut self, names: &[String]) -> Result<Vec<Skill>, DbError>;
    /// Ordered by `lower(name)`
    async fn list_skills(&mut self) -> Result<Vec<Skill>, DbError>;
    async fn insert_skill(&mut self, name: &str) -> Result<Skill, DbError>;
    async fn rename_skill(&mut self, id: Uuid, name: &str) -> Result<Option<Skill>, DbError>;
    async fn delete_skill(&mut self, id: Uuid) -> Result<bool, DbError>;

    // ========== Avatars ==========

    async fn avatar(&mut self, id: Uuid) -> Result<Option<Avatar>, DbError>;
    /// `(avatar_id, storage_key)` pairs for the given avatars
    async fn avatar_keys(&mut self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, DbError>;
    async fn insert_avatar(&mut self, avatar: &NewAvatar) -> Result<Avatar, DbError>;
    /// Set the status; `moderated_by` and `rejection_reason` are only written when `Some`
    async fn set_avatar_status(
        &mut self,
        id: Uuid,
        status: ModerationStatus,
        moderated_by: Option<Uuid>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Avatar>, DbError>;
    /// Flip every ACTIVE avatar of `user_id` other than `except` to ACCEPTED
    async fn demote_active_avatars(&mut self, user_id: Uuid, except: Uuid)
    -> Result<u64, DbError>;
    /// Most recently updated ACCEPTED avatar of `user_id`, ignoring `excluding`
    async fn latest_accepted_avatar(
        &mut self,
        user_id: Uuid,
        excluding: Uuid,
    ) -> Result<Option<Avatar>, DbError>;
    /// Ordered by `updated_at` descending
    async fn list_avatars_by_status(
        &mut self,
        status: ModerationStatus,
    ) -> Result<Vec<Avatar>, DbError>;
}
