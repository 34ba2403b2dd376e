//! PostgreSQL backend (sqlx)

mod avatars;
mod departments;
mod legal_entities;
mod skills;
mod users;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use shared::models::{
    Avatar, Department, DepartmentCreate, DepartmentUpdate, LegalEntity, ModerationStatus,
    NewUser, SearchQuery, Skill, User, UserAdminUpdate,
};

use super::{DbError, NewAvatar, Store, Transaction};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DbError::Sqlx(e.into()))?;

        Ok(Self { pool })
    }

    /// Wrap a pool whose schema is already migrated
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }

    // ========== Users ==========

    async fn user(&mut self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(users::find_by_id(&mut self.tx, id).await?)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError> {
        Ok(users::find_by_email(&mut self.tx, email).await?)
    }

    async fn list_users(&mut self, active_only: bool) -> Result<Vec<User>, DbError> {
        Ok(users::list(&mut self.tx, active_only).await?)
    }

    async fn users_in_department(&mut self, department_id: Uuid) -> Result<Vec<User>, DbError> {
        Ok(users::list_in_department(&mut self.tx, department_id).await?)
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, DbError> {
        Ok(users::create(&mut self.tx, user).await?)
    }

    async fn update_user(
        &mut self,
        id: Uuid,
        changes: &UserAdminUpdate,
    ) -> Result<Option<User>, DbError> {
        Ok(users::update(&mut self.tx, id, changes).await?)
    }

    async fn deactivate_user(&mut self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(users::deactivate(&mut self.tx, id).await?)
    }

    async fn search_users(&mut self, query: &SearchQuery) -> Result<Vec<User>, DbError> {
        Ok(users::search(&mut self.tx, query).await?)
    }

    async fn distinct_cities(&mut self) -> Result<Vec<String>, DbError> {
        Ok(users::distinct_cities(&mut self.tx).await?)
    }

    async fn distinct_positions(&mut self) -> Result<Vec<String>, DbError> {
        Ok(users::distinct_positions(&mut self.tx).await?)
    }

    async fn skills_of(&mut self, user_ids: &[Uuid]) -> Result<Vec<(Uuid, Skill)>, DbError> {
        Ok(users::skills_of(&mut self.tx, user_ids).await?)
    }

    async fn set_user_skills(&mut self, user_id: Uuid, skill_ids: &[Uuid]) -> Result<(), DbError> {
        Ok(users::set_skills(&mut self.tx, user_id, skill_ids).await?)
    }

    async fn set_current_avatar(
        &mut self,
        user_id: Uuid,
        avatar_id: Option<Uuid>,
    ) -> Result<(), DbError> {
        Ok(users::set_current_avatar(&mut self.tx, user_id, avatar_id).await?)
    }

    // ========== Departments ==========

    async fn department(&mut self, id: Uuid) -> Result<Option<Department>, DbError> {
        Ok(departments::find_by_id(&mut self.tx, id).await?)
    }

    async fn department_by_name(&mut self, name: &str) -> Result<Option<Department>, DbError> {
        Ok(departments::find_by_name(&mut self.tx, name).await?)
    }

    async fn list_departments(&mut self) -> Result<Vec<Department>, DbError> {
        Ok(departments::list(&mut self.tx).await?)
    }

    async fn subdepartments(&mut self, parent_id: Uuid) -> Result<Vec<Department>, DbError> {
        Ok(departments::list_children(&mut self.tx, parent_id).await?)
    }

    async fn managed_department(&mut self, user_id: Uuid) -> Result<Option<Department>, DbError> {
        Ok(departments::find_managed_by(&mut self.tx, user_id).await?)
    }

    async fn insert_department(&mut self, dept: &DepartmentCreate) -> Result<Department, DbError> {
        Ok(departments::create(&mut self.tx, dept).await?)
    }

    async fn update_department(
        &mut self,
        id: Uuid,
        changes: &DepartmentUpdate,
    ) -> Result<Option<Department>, DbError> {
        Ok(departments::update(&mut self.tx, id, changes).await?)
    }

    async fn delete_department(&mut self, id: Uuid) -> Result<bool, DbError> {
        Ok(departments::delete(&mut self.tx, id).await?)
    }

    async fn count_subdepartments(&mut self, id: Uuid) -> Result<i64, DbError> {
        Ok(departments::count_children(&mut self.tx, id).await?)
    }

    async fn count_employees(&mut self, id: Uuid) -> Result<i64, DbError> {
        Ok(departments::count_employees(&mut self.tx, id).await?)
    }

    async fn is_descendant(&mut self, child: Uuid, ancestor: Uuid) -> Result<bool, DbError> {
        Ok(departments::is_descendant(&mut self.tx, child, ancestor).await?)
    }

    // ========== Legal entities ==========

    async fn legal_entity(&mut self, id: Uuid) -> Result<Option<LegalEntity>, DbError> {
        Ok(legal_entities::find_by_id(&mut self.tx, id).await?)
    }

    async fn legal_entity_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<LegalEntity>, DbError> {
        Ok(legal_entities::find_by_name(&mut self.tx, name).await?)
    }

    async fn list_legal_entities(&mut self) -> Result<Vec<LegalEntity>, DbError> {
        Ok(legal_entities::list(&mut self.tx).await?)
    }

    async fn insert_legal_entity(&mut self, name: &str) -> Result<LegalEntity, DbError> {
        Ok(legal_entities::create(&mut self.tx, name).await?)
    }

    async fn rename_legal_entity(
        &mut self,
        id: Uuid,
        name: &str,
    ) -> Result<Option<LegalEntity>, DbError> {
        Ok(legal_entities::rename(&mut self.tx, id, name).await?)
    }

    async fn delete_legal_entity(&mut self, id: Uuid) -> Result<bool, DbError> {
        Ok(legal_entities::delete(&mut self.tx, id).await?)
    }

    async fn count_departments_of(&mut self, legal_entity_id: Uuid) -> Result<i64, DbError> {
        Ok(legal_entities::count_departments(&mut self.tx, legal_entity_id).await?)
    }

    // ========== Skills ==========

    async fn skill(&mut self, id: Uuid) -> Result<Option<Skill>, DbError> {
        Ok(skills::find_by_id(&mut self.tx, id).await?)
    }

    async fn skill_by_name(&mut self, name: &str) -> Result<Option<Skill>, DbError> {
        Ok(skills::find_by_name(&mut self.tx, name).await?)
    }

    async fn skills_by_names(&mut self, names: &[String]) -> Result<Vec<Skill>, DbError> {
        Ok(skills::find_by_names(&mut self.tx, names).await?)
    }

    async fn list_skills(&mut self) -> Result<Vec<Skill>, DbError> {
        Ok(skills::list(&mut self.tx).await?)
    }

    async fn insert_skill(&mut self, name: &str) -> Result<Skill, DbError> {
        Ok(skills::create(&mut self.tx, name).await?)
    }

    async fn rename_skill(&mut self, id: Uuid, name: &str) -> Result<Option<Skill>, DbError> {
        Ok(skills::rename(&mut self.tx, id, name).await?)
    }

    async fn delete_skill(&mut self, id: Uuid) -> Result<bool, DbError> {
        Ok(skills::delete(&mut self.tx, id).await?)
    }

    // ========== Avatars ==========

    async fn avatar(&mut self, id: Uuid) -> Result<Option<Avatar>, DbError> {
        Ok(avatars::find_by_id(&mut self.tx, id).await?)
    }

    async fn avatar_keys(&mut self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, DbError> {
        Ok(avatars::storage_keys(&mut self.tx, ids).await?)
    }

    async fn insert_avatar(&mut self, avatar: &NewAvatar) -> Result<Avatar, DbError> {
        Ok(avatars::create(&mut self.tx, avatar).await?)
    }

    async fn set_avatar_status(
        &mut self,
        id: Uuid,
        status: ModerationStatus,
        moderated_by: Option<Uuid>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Avatar>, DbError> {
        Ok(avatars::set_status(&mut self.tx, id, status, moderated_by, rejection_reason).await?)
    }

    async fn demote_active_avatars(
        &mut self,
        user_id: Uuid,
        except: Uuid,
    ) -> Result<u64, DbError> {
        Ok(avatars::demote_active(&mut self.tx, user_id, except).await?)
    }

    async fn latest_accepted_avatar(
        &mut self,
        user_id: Uuid,
        excluding: Uuid,
    ) -> Result<Option<Avatar>, DbError> {
        Ok(avatars::latest_accepted(&mut self.tx, user_id, excluding).await?)
    }

    async fn list_avatars_by_status(
        &mut self,
        status: ModerationStatus,
    ) -> Result<Vec<Avatar>, DbError> {
        Ok(avatars::list_by_status(&mut self.tx, status).await?)
    }
}
