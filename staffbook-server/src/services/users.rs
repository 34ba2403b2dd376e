//! User manager: profiles, skills and search

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    SearchQuery, Skill, User, UserAdminUpdate, UserSelfUpdate, UserView, avatar_url,
};
use shared::util::normalize_email;
use uuid::Uuid;

use crate::access::{self, Operation};
use crate::auth::CurrentUser;
use crate::db::Transaction;
use crate::error::ServiceResult;
use crate::state::AppState;

pub(crate) fn not_found(id: Uuid) -> AppError {
    AppError::new(ErrorCode::EmployeeNotFound).with_detail("user_id", id.to_string())
}

fn into_view(user: User, photo_url: Option<String>, skills: Vec<Skill>) -> UserView {
    UserView {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        position: user.position,
        department_id: user.department_id,
        role: user.role,
        city: user.city,
        phone: user.phone,
        telegram: user.telegram,
        mattermost: user.mattermost,
        bio: user.bio,
        birthday: user.birthday,
        employee_status: user.employee_status,
        current_avatar_id: user.current_avatar_id,
        photo_url,
        skills,
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Attach photo URLs and skills, preserving the input order
pub(crate) async fn views(
    tx: &mut dyn Transaction,
    users: Vec<User>,
) -> ServiceResult<Vec<UserView>> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let avatar_ids: Vec<Uuid> = users.iter().filter_map(|u| u.current_avatar_id).collect();

    let mut skills: HashMap<Uuid, Vec<Skill>> = HashMap::new();
    for (user_id, skill) in tx.skills_of(&ids).await? {
        skills.entry(user_id).or_default().push(skill);
    }
    let keys: HashMap<Uuid, String> = tx.avatar_keys(&avatar_ids).await?.into_iter().collect();

    Ok(users
        .into_iter()
        .map(|user| {
            let photo_url = user
                .current_avatar_id
                .and_then(|a| keys.get(&a))
                .map(|key| avatar_url(key));
            let user_skills = skills.remove(&user.id).unwrap_or_default();
            into_view(user, photo_url, user_skills)
        })
        .collect())
}

pub(crate) async fn view(tx: &mut dyn Transaction, user: User) -> ServiceResult<UserView> {
    let mut views = views(tx, vec![user]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::internal("user view missing").into())
}

fn non_blank(field: &'static str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    Ok(value.to_string())
}

pub async fn get(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<UserView> {
    access::authorize(actor, Operation::ReadEmployees)?;

    let mut tx = state.store.begin().await?;
    let user = tx.user(id).await?.ok_or_else(|| not_found(id))?;
    view(tx.as_mut(), user).await
}

pub async fn list(
    state: &AppState,
    actor: &CurrentUser,
    active_only: bool,
) -> ServiceResult<Vec<UserView>> {
    access::authorize(actor, Operation::ReadEmployees)?;

    let mut tx = state.store.begin().await?;
    let users = tx.list_users(active_only).await?;
    views(tx.as_mut(), users).await
}

/// Administrative profile update
pub async fn update(
    state: &AppState,
    actor: &CurrentUser,
    id: Uuid,
    mut changes: UserAdminUpdate,
) -> ServiceResult<UserView> {
    access::authorize(actor, Operation::UpdateEmployee)?;
    if let Some(v) = changes.first_name.take() {
        changes.first_name = Some(non_blank("first_name", &v)?);
    }
    if let Some(v) = changes.last_name.take() {
        changes.last_name = Some(non_blank("last_name", &v)?);
    }
    if let Some(v) = changes.email.take() {
        changes.email = Some(normalize_email(&non_blank("email", &v)?));
    }

    let mut tx = state.store.begin().await?;

    if tx.user(id).await?.is_none() {
        return Err(not_found(id).into());
    }
    if let Some(email) = &changes.email
        && let Some(existing) = tx.user_by_email(email).await?
        && existing.id != id
    {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists)
            .with_detail("email", email.as_str())
            .into());
    }
    if let Some(Some(department_id)) = changes.department_id
        && tx.department(department_id).await?.is_none()
    {
        return Err(AppError::new(ErrorCode::DepartmentNotFound)
            .with_detail("department_id", department_id.to_string())
            .into());
    }

    let user = tx
        .update_user(id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;
    let updated = view(tx.as_mut(), user).await?;
    tx.commit().await?;

    tracing::info!(user_id = %id, actor_id = %actor.id, "Employee updated");
    Ok(updated)
}

/// Self-service profile update
pub async fn update_self(
    state: &AppState,
    actor: &CurrentUser,
    id: Uuid,
    changes: UserSelfUpdate,
) -> ServiceResult<UserView> {
    access::authorize_self_or(actor, Operation::UpdateOwnProfile, id)?;

    let mut tx = state.store.begin().await?;
    let user = tx
        .update_user(
            id,
            &UserAdminUpdate {
                profile: changes,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| not_found(id))?;
    let updated = view(tx.as_mut(), user).await?;
    tx.commit().await?;

    tracing::info!(user_id = %id, "Profile updated");
    Ok(updated)
}

/// Soft delete
pub async fn deactivate(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<()> {
    access::authorize(actor, Operation::DeactivateEmployee)?;

    let mut tx = state.store.begin().await?;
    tx.deactivate_user(id).await?.ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(user_id = %id, actor_id = %actor.id, "Employee deactivated");
    Ok(())
}

/// Replace the user's skills; every name must already exist
pub async fn set_skills(
    state: &AppState,
    actor: &CurrentUser,
    id: Uuid,
    names: Vec<String>,
) -> ServiceResult<UserView> {
    access::authorize(actor, Operation::SetEmployeeSkills)?;

    let mut wanted: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !wanted.iter().any(|w| w.eq_ignore_ascii_case(&name)) {
            wanted.push(name);
        }
    }

    let mut tx = state.store.begin().await?;

    if tx.user(id).await?.is_none() {
        return Err(not_found(id).into());
    }
    let found = tx.skills_by_names(&wanted).await?;
    let missing: Vec<&str> = wanted
        .iter()
        .filter(|w| !found.iter().any(|s| s.name.to_lowercase() == w.to_lowercase()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::SkillNotFound,
            format!("Unknown skills: {}", missing.join(", ")),
        )
        .with_detail("missing", missing)
        .into());
    }

    let skill_ids: Vec<Uuid> = found.iter().map(|s| s.id).collect();
    tx.set_user_skills(id, &skill_ids).await?;
    let user = tx.user(id).await?.ok_or_else(|| not_found(id))?;
    let updated = view(tx.as_mut(), user).await?;
    tx.commit().await?;

    tracing::info!(user_id = %id, skills = skill_ids.len(), "Employee skills replaced");
    Ok(updated)
}

/// Fuzzy search over active employees
pub async fn search(
    state: &AppState,
    actor: &CurrentUser,
    query: SearchQuery,
) -> ServiceResult<Vec<UserView>> {
    access::authorize(actor, Operation::ReadEmployees)?;

    let mut tx = state.store.begin().await?;
    let users: Vec<User> = tx
        .search_users(&query)
        .await?
        .into_iter()
        .filter(|u| u.is_active)
        .collect();
    views(tx.as_mut(), users).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::app_error;
    use shared::models::{NewUser, Role};

    async fn seed(state: &AppState, email: &str, role: Role) -> CurrentUser {
        let mut tx = state.store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewUser {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                email: email.into(),
                password_hash: "x".into(),
                role,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        CurrentUser::from(&user)
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let state = AppState::in_memory(&Config::for_tests());
        let admin = seed(&state, "admin@example.com", Role::SystemAdmin).await;
        let ann = seed(&state, "ann@example.com", Role::Employee).await;

        let err = app_error(
            update(
                &state,
                &admin,
                ann.id,
                UserAdminUpdate {
                    email: Some(" ADMIN@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::EmailAlreadyExists);
    }

    #[tokio::test]
    async fn test_update_requires_existing_department() {
        let state = AppState::in_memory(&Config::for_tests());
        let admin = seed(&state, "admin@example.com", Role::HrAdmin).await;
        let err = app_error(
            update(
                &state,
                &admin,
                admin.id,
                UserAdminUpdate {
                    department_id: Some(Some(Uuid::new_v4())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentNotFound);
    }

    #[tokio::test]
    async fn test_self_update_only_own_record() {
        let state = AppState::in_memory(&Config::for_tests());
        let ann = seed(&state, "ann@example.com", Role::Employee).await;
        let bob = seed(&state, "bob@example.com", Role::Employee).await;
        let changes = UserSelfUpdate {
            telegram: Some("@ann".into()),
            ..Default::default()
        };

        let own = update_self(&state, &ann, ann.id, changes.clone()).await.unwrap();
        assert_eq!(own.telegram.as_deref(), Some("@ann"));

        let err = app_error(update_self(&state, &ann, bob.id, changes).await.unwrap_err());
        assert_eq!(err.code, ErrorCode::NotResourceOwner);
    }

    #[tokio::test]
    async fn test_set_skills_reports_missing_names() {
        let state = AppState::in_memory(&Config::for_tests());
        let admin = seed(&state, "admin@example.com", Role::HrAdmin).await;
        {
            let mut tx = state.store.begin().await.unwrap();
            tx.insert_skill("Rust").await.unwrap();
            tx.commit().await.unwrap();
        }

        let err = app_error(
            set_skills(&state, &admin, admin.id, vec!["rust".into(), "Cobol".into()])
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::SkillNotFound);
        assert!(err.message.contains("Cobol"));

        let view = set_skills(&state, &admin, admin.id, vec!["RUST".into(), "rust".into()])
            .await
            .unwrap();
        assert_eq!(view.skills.len(), 1);
        assert_eq!(view.skills[0].name, "Rust");
    }

    #[tokio::test]
    async fn test_deactivated_users_leave_active_list() {
        let state = AppState::in_memory(&Config::for_tests());
        let admin = seed(&state, "admin@example.com", Role::HrAdmin).await;
        let ann = seed(&state, "ann@example.com", Role::Employee).await;

        deactivate(&state, &admin, ann.id).await.unwrap();

        let active = list(&state, &admin, true).await.unwrap();
        assert!(active.iter().all(|u| u.id != ann.id));
        let all = list(&state, &admin, false).await.unwrap();
        assert!(all.iter().any(|u| u.id == ann.id && !u.is_active));

        let found = search(&state, &admin, SearchQuery::default()).await.unwrap();
        assert!(found.iter().all(|u| u.id != ann.id));
    }
}
