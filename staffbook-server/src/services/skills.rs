//! Skill manager. Names are unique ignoring case.

use shared::error::{AppError, ErrorCode};
use shared::models::Skill;
use uuid::Uuid;

use crate::access::{self, Operation};
use crate::auth::CurrentUser;
use crate::db::Transaction;
use crate::error::ServiceResult;
use crate::state::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::new(ErrorCode::SkillNotFound).with_detail("skill_id", id.to_string())
}

async fn check_name_free(
    tx: &mut dyn Transaction,
    name: &str,
    own_id: Option<Uuid>,
) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(
            AppError::with_message(ErrorCode::RequiredField, "Skill name must not be empty").into(),
        );
    }
    if let Some(existing) = tx.skill_by_name(name).await?
        && Some(existing.id) != own_id
    {
        return Err(AppError::new(ErrorCode::SkillNameExists)
            .with_detail("name", existing.name)
            .into());
    }
    Ok(name.to_string())
}

pub async fn create(state: &AppState, actor: &CurrentUser, name: &str) -> ServiceResult<Skill> {
    access::authorize(actor, Operation::ManageSkills)?;

    let mut tx = state.store.begin().await?;
    let name = check_name_free(tx.as_mut(), name, None).await?;
    let skill = tx.insert_skill(&name).await?;
    tx.commit().await?;

    tracing::info!(skill_id = %skill.id, name = %skill.name, "Skill created");
    Ok(skill)
}

pub async fn get(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<Skill> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    Ok(tx.skill(id).await?.ok_or_else(|| not_found(id))?)
}

pub async fn list(state: &AppState, actor: &CurrentUser) -> ServiceResult<Vec<Skill>> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    Ok(tx.list_skills().await?)
}

pub async fn rename(
    state: &AppState,
    actor: &CurrentUser,
    id: Uuid,
    name: &str,
) -> ServiceResult<Skill> {
    access::authorize(actor, Operation::ManageSkills)?;

    let mut tx = state.store.begin().await?;
    if tx.skill(id).await?.is_none() {
        return Err(not_found(id).into());
    }
    let name = check_name_free(tx.as_mut(), name, Some(id)).await?;
    let skill = tx.rename_skill(id, &name).await?.ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(skill_id = %id, name = %skill.name, "Skill renamed");
    Ok(skill)
}

pub async fn delete(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<()> {
    access::authorize(actor, Operation::ManageSkills)?;

    let mut tx = state.store.begin().await?;
    if !tx.delete_skill(id).await? {
        return Err(not_found(id).into());
    }
    tx.commit().await?;

    tracing::info!(skill_id = %id, "Skill deleted");
    Ok(())
}
