//! In-memory backend
//!
//! Keeps every table in one struct behind a mutex. A transaction holds the
//! lock for its whole lifetime and works on a copy, which is written back on
//! commit and discarded on drop. Constraints enforced by the SQL schema
//! (uniques, foreign keys, RESTRICT deletes, one ACTIVE avatar per user) are
//! checked here as well and reported as [`DbError::Integrity`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use shared::models::{
    Avatar, Department, DepartmentCreate, DepartmentUpdate, LegalEntity, ModerationStatus,
    NewUser, SearchQuery, Skill, User, UserAdminUpdate,
};
use shared::util::now_millis;

use super::{DbError, NewAvatar, Store, Transaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    departments: HashMap<Uuid, Department>,
    legal_entities: HashMap<Uuid, LegalEntity>,
    skills: HashMap<Uuid, Skill>,
    avatars: HashMap<Uuid, Avatar>,
    user_skills: HashSet<(Uuid, Uuid)>,
    /// Last issued timestamp; keeps `updated_at` strictly increasing
    clock: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, work }))
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

fn integrity(msg: impl Into<String>) -> DbError {
    DbError::Integrity(msg.into())
}

impl Tables {
    fn tick(&mut self) -> i64 {
        self.clock = now_millis().max(self.clock + 1);
        self.clock
    }

    fn check_user(&self, user: &User) -> Result<(), DbError> {
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(integrity(format!(
                "Key (email)=({}) already exists.",
                user.email
            )));
        }
        if let Some(dept) = user.department_id
            && !self.departments.contains_key(&dept)
        {
            return Err(integrity(format!(
                "Key (department_id)=({}) is not present in table \"departments\".",
                dept
            )));
        }
        if let Some(avatar) = user.current_avatar_id
            && !self.avatars.contains_key(&avatar)
        {
            return Err(integrity(format!(
                "Key (current_avatar_id)=({}) is not present in table \"avatars\".",
                avatar
            )));
        }
        Ok(())
    }

    fn check_department(&self, dept: &Department) -> Result<(), DbError> {
        if self
            .departments
            .values()
            .any(|d| d.id != dept.id && d.name == dept.name)
        {
            return Err(integrity(format!(
                "Key (name)=({}) already exists.",
                dept.name
            )));
        }
        if !self.legal_entities.contains_key(&dept.legal_entity_id) {
            return Err(integrity(format!(
                "Key (legal_entity_id)=({}) is not present in table \"legal_entities\".",
                dept.legal_entity_id
            )));
        }
        if let Some(parent) = dept.parent_id {
            if parent == dept.id {
                return Err(integrity("Failing row violates \"departments_not_own_parent\"."));
            }
            if !self.departments.contains_key(&parent) {
                return Err(integrity(format!(
                    "Key (parent_id)=({}) is not present in table \"departments\".",
                    parent
                )));
            }
        }
        if let Some(manager) = dept.manager_id {
            if !self.users.contains_key(&manager) {
                return Err(integrity(format!(
                    "Key (manager_id)=({}) is not present in table \"users\".",
                    manager
                )));
            }
            if self
                .departments
                .values()
                .any(|d| d.id != dept.id && d.manager_id == Some(manager))
            {
                return Err(integrity(format!(
                    "Key (manager_id)=({}) already exists.",
                    manager
                )));
            }
        }
        Ok(())
    }

    fn check_skill_name(&self, id: Uuid, name: &str) -> Result<(), DbError> {
        let lowered = name.to_lowercase();
        if self
            .skills
            .values()
            .any(|s| s.id != id && s.name.to_lowercase() == lowered)
        {
            return Err(integrity(format!(
                "Key (lower(name::text))=({}) already exists.",
                lowered
            )));
        }
        Ok(())
    }

    fn check_legal_entity_name(&self, id: Uuid, name: &str) -> Result<(), DbError> {
        if self
            .legal_entities
            .values()
            .any(|le| le.id != id && le.name == name)
        {
            return Err(integrity(format!("Key (name)=({}) already exists.", name)));
        }
        Ok(())
    }

    fn check_avatar(&self, avatar: &Avatar) -> Result<(), DbError> {
        if !self.users.contains_key(&avatar.user_id) {
            return Err(integrity(format!(
                "Key (user_id)=({}) is not present in table \"users\".",
                avatar.user_id
            )));
        }
        if self
            .avatars
            .values()
            .any(|a| a.id != avatar.id && a.storage_key == avatar.storage_key)
        {
            return Err(integrity(format!(
                "Key (storage_key)=({}) already exists.",
                avatar.storage_key
            )));
        }
        if avatar.moderation_status == ModerationStatus::Active
            && self.avatars.values().any(|a| {
                a.id != avatar.id
                    && a.user_id == avatar.user_id
                    && a.moderation_status == ModerationStatus::Active
            })
        {
            return Err(integrity(format!(
                "Key (user_id)=({}) already exists.",
                avatar.user_id
            )));
        }
        Ok(())
    }

    fn sorted_users(&self, mut users: Vec<User>) -> Vec<User> {
        users.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        users
    }
}

/// Trigrams of each word, padded the way `pg_trgm` pads them
fn trigrams(text: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!("  {} ", word.to_lowercase()).chars().collect();
        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }
    set
}

fn similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / union as f64
}

fn fuzzy_field(user: &User) -> String {
    format!(
        "{} {} {} {}",
        user.first_name,
        user.last_name,
        user.position.as_deref().unwrap_or(""),
        user.email
    )
    .to_lowercase()
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let MemoryTransaction { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    // ========== Users ==========

    async fn user(&mut self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self.work.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&mut self, active_only: bool) -> Result<Vec<User>, DbError> {
        let users = self
            .work
            .users
            .values()
            .filter(|u| !active_only || u.is_active)
            .cloned()
            .collect();
        Ok(self.work.sorted_users(users))
    }

    async fn users_in_department(&mut self, department_id: Uuid) -> Result<Vec<User>, DbError> {
        let users = self
            .work
            .users
            .values()
            .filter(|u| u.department_id == Some(department_id))
            .cloned()
            .collect();
        Ok(self.work.sorted_users(users))
    }

    async fn insert_user(&mut self, new: &NewUser) -> Result<User, DbError> {
        let now = self.work.tick();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            position: None,
            department_id: None,
            role: new.role,
            city: None,
            phone: None,
            telegram: None,
            mattermost: None,
            bio: None,
            birthday: None,
            employee_status: None,
            current_avatar_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.check_user(&user)?;
        self.work.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &mut self,
        id: Uuid,
        changes: &UserAdminUpdate,
    ) -> Result<Option<User>, DbError> {
        let Some(mut user) = self.work.users.get(&id).cloned() else {
            return Ok(None);
        };
        let profile = &changes.profile;
        if let Some(v) = &changes.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &changes.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = &changes.position {
            user.position = Some(v.clone());
        }
        if let Some(v) = changes.department_id {
            user.department_id = v;
        }
        if let Some(v) = changes.role {
            user.role = v;
        }
        if let Some(v) = &changes.city {
            user.city = Some(v.clone());
        }
        if let Some(v) = changes.birthday {
            user.birthday = Some(v);
        }
        if let Some(v) = &profile.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &profile.telegram {
            user.telegram = Some(v.clone());
        }
        if let Some(v) = &profile.mattermost {
            user.mattermost = Some(v.clone());
        }
        if let Some(v) = profile.employee_status {
            user.employee_status = Some(v);
        }
        if let Some(v) = &profile.bio {
            user.bio = Some(v.clone());
        }
        user.updated_at = self.work.tick();
        self.work.check_user(&user)?;
        self.work.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn deactivate_user(&mut self, id: Uuid) -> Result<Option<User>, DbError> {
        let now = self.work.tick();
        Ok(self.work.users.get_mut(&id).map(|user| {
            user.is_active = false;
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn search_users(&mut self, query: &SearchQuery) -> Result<Vec<User>, DbError> {
        let cities: HashSet<String> = query.cities.iter().map(|c| c.to_lowercase()).collect();
        let skills: HashSet<String> = query.skills.iter().map(|s| s.to_lowercase()).collect();
        let tables = &self.work;

        let mut matched: Vec<User> = tables
            .users
            .values()
            .filter(|u| {
                cities.is_empty()
                    || u.city
                        .as_ref()
                        .is_some_and(|c| cities.contains(&c.to_lowercase()))
            })
            .filter(|u| {
                query.departments.is_empty()
                    || u.department_id
                        .is_some_and(|d| query.departments.contains(&d))
            })
            .filter(|u| {
                query.legal_entities.is_empty()
                    || u.department_id
                        .and_then(|d| tables.departments.get(&d))
                        .is_some_and(|d| query.legal_entities.contains(&d.legal_entity_id))
            })
            .filter(|u| {
                if skills.is_empty() {
                    return true;
                }
                let owned: HashSet<String> = tables
                    .user_skills
                    .iter()
                    .filter(|(user_id, _)| *user_id == u.id)
                    .filter_map(|(_, skill_id)| tables.skills.get(skill_id))
                    .map(|s| s.name.to_lowercase())
                    .collect();
                skills.is_subset(&owned)
            })
            .cloned()
            .collect();

        matched = tables.sorted_users(matched);
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            let mut scored: Vec<(f64, User)> = matched
                .into_iter()
                .map(|u| (similarity(&fuzzy_field(&u), &q), u))
                .collect();
            // stable sort keeps the name order among equal scores
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            matched = scored.into_iter().map(|(_, u)| u).collect();
        }
        Ok(matched)
    }

    async fn distinct_cities(&mut self) -> Result<Vec<String>, DbError> {
        let mut cities: Vec<String> = self
            .work
            .users
            .values()
            .filter_map(|u| u.city.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        cities.sort_by_key(|c| (c.to_lowercase(), c.clone()));
        Ok(cities)
    }

    async fn distinct_positions(&mut self) -> Result<Vec<String>, DbError> {
        let mut positions: Vec<String> = self
            .work
            .users
            .values()
            .filter_map(|u| u.position.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        positions.sort_by_key(|p| (p.to_lowercase(), p.clone()));
        Ok(positions)
    }

    async fn skills_of(&mut self, user_ids: &[Uuid]) -> Result<Vec<(Uuid, Skill)>, DbError> {
        let mut pairs: Vec<(Uuid, Skill)> = self
            .work
            .user_skills
            .iter()
            .filter(|(user_id, _)| user_ids.contains(user_id))
            .filter_map(|(user_id, skill_id)| {
                self.work
                    .skills
                    .get(skill_id)
                    .map(|s| (*user_id, s.clone()))
            })
            .collect();
        pairs.sort_by_key(|(_, s)| s.name.to_lowercase());
        Ok(pairs)
    }

    async fn set_user_skills(&mut self, user_id: Uuid, skill_ids: &[Uuid]) -> Result<(), DbError> {
        if !self.work.users.contains_key(&user_id) {
            return Err(integrity(format!(
                "Key (user_id)=({}) is not present in table \"users\".",
                user_id
            )));
        }
        if let Some(missing) = skill_ids.iter().find(|id| !self.work.skills.contains_key(id)) {
            return Err(integrity(format!(
                "Key (skill_id)=({}) is not present in table \"skills\".",
                missing
            )));
        }
        self.work.user_skills.retain(|(u, _)| *u != user_id);
        for skill_id in skill_ids {
            self.work.user_skills.insert((user_id, *skill_id));
        }
        let now = self.work.tick();
        if let Some(user) = self.work.users.get_mut(&user_id) {
            user.updated_at = now;
        }
        Ok(())
    }

    async fn set_current_avatar(
        &mut self,
        user_id: Uuid,
        avatar_id: Option<Uuid>,
    ) -> Result<(), DbError> {
        let Some(mut user) = self.work.users.get(&user_id).cloned() else {
            return Ok(());
        };
        user.current_avatar_id = avatar_id;
        user.updated_at = self.work.tick();
        self.work.check_user(&user)?;
        self.work.users.insert(user_id, user);
        Ok(())
    }

    // ========== Departments ==========

    async fn department(&mut self, id: Uuid) -> Result<Option<Department>, DbError> {
        Ok(self.work.departments.get(&id).cloned())
    }

    async fn department_by_name(&mut self, name: &str) -> Result<Option<Department>, DbError> {
        Ok(self
            .work
            .departments
            .values()
            .find(|d| d.name == name)
            .cloned())
    }

    async fn list_departments(&mut self) -> Result<Vec<Department>, DbError> {
        let mut all: Vec<Department> = self.work.departments.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn subdepartments(&mut self, parent_id: Uuid) -> Result<Vec<Department>, DbError> {
        let mut children: Vec<Department> = self
            .work
            .departments
            .values()
            .filter(|d| d.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn managed_department(&mut self, user_id: Uuid) -> Result<Option<Department>, DbError> {
        Ok(self
            .work
            .departments
            .values()
            .find(|d| d.manager_id == Some(user_id))
            .cloned())
    }

    async fn insert_department(&mut self, new: &DepartmentCreate) -> Result<Department, DbError> {
        let now = self.work.tick();
        let dept = Department {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            legal_entity_id: new.legal_entity_id,
            parent_id: new.parent_id,
            manager_id: None,
            created_at: now,
            updated_at: now,
        };
        self.work.check_department(&dept)?;
        self.work.departments.insert(dept.id, dept.clone());
        Ok(dept)
    }

    async fn update_department(
        &mut self,
        id: Uuid,
        changes: &DepartmentUpdate,
    ) -> Result<Option<Department>, DbError> {
        let Some(mut dept) = self.work.departments.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            dept.name = name.clone();
        }
        if let Some(parent_id) = changes.parent_id {
            dept.parent_id = parent_id;
        }
        if let Some(manager_id) = changes.manager_id {
            dept.manager_id = manager_id;
        }
        dept.updated_at = self.work.tick();
        self.work.check_department(&dept)?;
        self.work.departments.insert(id, dept.clone());
        Ok(Some(dept))
    }

    async fn delete_department(&mut self, id: Uuid) -> Result<bool, DbError> {
        if self
            .work
            .departments
            .values()
            .any(|d| d.parent_id == Some(id))
        {
            return Err(integrity(format!(
                "Key (id)=({}) is still referenced from table \"departments\".",
                id
            )));
        }
        if self
            .work
            .users
            .values()
            .any(|u| u.department_id == Some(id))
        {
            return Err(integrity(format!(
                "Key (id)=({}) is still referenced from table \"users\".",
                id
            )));
        }
        Ok(self.work.departments.remove(&id).is_some())
    }

    async fn count_subdepartments(&mut self, id: Uuid) -> Result<i64, DbError> {
        Ok(self
            .work
            .departments
            .values()
            .filter(|d| d.parent_id == Some(id))
            .count() as i64)
    }

    async fn count_employees(&mut self, id: Uuid) -> Result<i64, DbError> {
        Ok(self
            .work
            .users
            .values()
            .filter(|u| u.department_id == Some(id))
            .count() as i64)
    }

    async fn is_descendant(&mut self, child: Uuid, ancestor: Uuid) -> Result<bool, DbError> {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for dept in self.work.departments.values() {
            if let Some(parent) = dept.parent_id {
                children.entry(parent).or_default().push(dept.id);
            }
        }

        let mut visited = HashSet::from([ancestor]);
        let mut queue = VecDeque::from([ancestor]);
        while let Some(current) = queue.pop_front() {
            if current == child {
                return Ok(true);
            }
            for next in children.get(&current).into_iter().flatten() {
                if visited.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        Ok(false)
    }

    // ========== Legal entities ==========

    async fn legal_entity(&mut self, id: Uuid) -> Result<Option<LegalEntity>, DbError> {
        Ok(self.work.legal_entities.get(&id).cloned())
    }

    async fn legal_entity_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<LegalEntity>, DbError> {
        Ok(self
            .work
            .legal_entities
            .values()
            .find(|le| le.name == name)
            .cloned())
    }

    async fn list_legal_entities(&mut self) -> Result<Vec<LegalEntity>, DbError> {
        let mut all: Vec<LegalEntity> = self.work.legal_entities.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn insert_legal_entity(&mut self, name: &str) -> Result<LegalEntity, DbError> {
        let now = self.work.tick();
        let entity = LegalEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.work.check_legal_entity_name(entity.id, name)?;
        self.work.legal_entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn rename_legal_entity(
        &mut self,
        id: Uuid,
        name: &str,
    ) -> Result<Option<LegalEntity>, DbError> {
        self.work.check_legal_entity_name(id, name)?;
        let now = self.work.tick();
        Ok(self.work.legal_entities.get_mut(&id).map(|entity| {
            entity.name = name.to_string();
            entity.updated_at = now;
            entity.clone()
        }))
    }

    async fn delete_legal_entity(&mut self, id: Uuid) -> Result<bool, DbError> {
        if self
            .work
            .departments
            .values()
            .any(|d| d.legal_entity_id == id)
        {
            return Err(integrity(format!(
                "Key (id)=({}) is still referenced from table \"departments\".",
                id
            )));
        }
        Ok(self.work.legal_entities.remove(&id).is_some())
    }

    async fn count_departments_of(&mut self, legal_entity_id: Uuid) -> Result<i64, DbError> {
        Ok(self
            .work
            .departments
            .values()
            .filter(|d| d.legal_entity_id == legal_entity_id)
            .count() as i64)
    }

    // ========== Skills ==========

    async fn skill(&mut self, id: Uuid) -> Result<Option<Skill>, DbError> {
        Ok(self.work.skills.get(&id).cloned())
    }

    async fn skill_by_name(&mut self, name: &str) -> Result<Option<Skill>, DbError> {
        let lowered = name.to_lowercase();
        Ok(self
            .work
            .skills
            .values()
            .find(|s| s.name.to_lowercase() == lowered)
            .cloned())
    }

    async fn skills_by_names(&mut self, names: &[String]) -> Result<Vec<Skill>, DbError> {
        let wanted: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let mut found: Vec<Skill> = self
            .work
            .skills
            .values()
            .filter(|s| wanted.contains(&s.name.to_lowercase()))
            .cloned()
            .collect();
        found.sort_by_key(|s| s.name.to_lowercase());
        Ok(found)
    }

    async fn list_skills(&mut self) -> Result<Vec<Skill>, DbError> {
        let mut all: Vec<Skill> = self.work.skills.values().cloned().collect();
        all.sort_by_key(|s| s.name.to_lowercase());
        Ok(all)
    }

    async fn insert_skill(&mut self, name: &str) -> Result<Skill, DbError> {
        let now = self.work.tick();
        let skill = Skill {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.work.check_skill_name(skill.id, name)?;
        self.work.skills.insert(skill.id, skill.clone());
        Ok(skill)
    }

    async fn rename_skill(&mut self, id: Uuid, name: &str) -> Result<Option<Skill>, DbError> {
        self.work.check_skill_name(id, name)?;
        let now = self.work.tick();
        Ok(self.work.skills.get_mut(&id).map(|skill| {
            skill.name = name.to_string();
            skill.updated_at = now;
            skill.clone()
        }))
    }

    async fn delete_skill(&mut self, id: Uuid) -> Result<bool, DbError> {
        // association rows cascade
        self.work.user_skills.retain(|(_, skill_id)| *skill_id != id);
        Ok(self.work.skills.remove(&id).is_some())
    }

    // ========== Avatars ==========

    async fn avatar(&mut self, id: Uuid) -> Result<Option<Avatar>, DbError> {
        Ok(self.work.avatars.get(&id).cloned())
    }

    async fn avatar_keys(&mut self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, DbError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.work
                    .avatars
                    .get(id)
                    .map(|a| (a.id, a.storage_key.clone()))
            })
            .collect())
    }

    async fn insert_avatar(&mut self, new: &NewAvatar) -> Result<Avatar, DbError> {
        let now = self.work.tick();
        let avatar = Avatar {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            moderation_status: new.status,
            moderated_by_id: new.moderated_by_id,
            storage_key: new.storage_key.clone(),
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.work.check_avatar(&avatar)?;
        self.work.avatars.insert(avatar.id, avatar.clone());
        Ok(avatar)
    }

    async fn set_avatar_status(
        &mut self,
        id: Uuid,
        status: ModerationStatus,
        moderated_by: Option<Uuid>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Avatar>, DbError> {
        let Some(mut avatar) = self.work.avatars.get(&id).cloned() else {
            return Ok(None);
        };
        avatar.moderation_status = status;
        if let Some(moderator) = moderated_by {
            avatar.moderated_by_id = Some(moderator);
        }
        if let Some(reason) = rejection_reason {
            avatar.rejection_reason = Some(reason.to_string());
        }
        avatar.updated_at = self.work.tick();
        self.work.check_avatar(&avatar)?;
        self.work.avatars.insert(id, avatar.clone());
        Ok(Some(avatar))
    }

    async fn demote_active_avatars(
        &mut self,
        user_id: Uuid,
        except: Uuid,
    ) -> Result<u64, DbError> {
        let now = self.work.tick();
        let mut demoted = 0;
        for avatar in self.work.avatars.values_mut() {
            if avatar.user_id == user_id
                && avatar.id != except
                && avatar.moderation_status == ModerationStatus::Active
            {
                avatar.moderation_status = ModerationStatus::Accepted;
                avatar.updated_at = now;
                demoted += 1;
            }
        }
        Ok(demoted)
    }

    async fn latest_accepted_avatar(
        &mut self,
        user_id: Uuid,
        excluding: Uuid,
    ) -> Result<Option<Avatar>, DbError> {
        Ok(self
            .work
            .avatars
            .values()
            .filter(|a| {
                a.user_id == user_id
                    && a.id != excluding
                    && a.moderation_status == ModerationStatus::Accepted
            })
            .max_by_key(|a| a.updated_at)
            .cloned())
    }

    async fn list_avatars_by_status(
        &mut self,
        status: ModerationStatus,
    ) -> Result<Vec<Avatar>, DbError> {
        let mut avatars: Vec<Avatar> = self
            .work
            .avatars
            .values()
            .filter(|a| a.moderation_status == status)
            .cloned()
            .collect();
        avatars.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(avatars)
    }
}
