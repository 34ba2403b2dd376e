//! Legal entity manager

use shared::error::{AppError, ErrorCode};
use shared::models::LegalEntity;
use uuid::Uuid;

use crate::access::{self, Operation};
use crate::auth::CurrentUser;
use crate::db::Transaction;
use crate::error::ServiceResult;
use crate::state::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::new(ErrorCode::LegalEntityNotFound).with_detail("legal_entity_id", id.to_string())
}

async fn check_name_free(
    tx: &mut dyn Transaction,
    name: &str,
    own_id: Option<Uuid>,
) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "Legal entity name must not be empty",
        )
        .into());
    }
    if let Some(existing) = tx.legal_entity_by_name(name).await?
        && Some(existing.id) != own_id
    {
        return Err(AppError::new(ErrorCode::LegalEntityNameExists)
            .with_detail("name", name)
            .into());
    }
    Ok(name.to_string())
}

pub async fn create(state: &AppState, actor: &CurrentUser, name: &str) -> ServiceResult<LegalEntity> {
    access::authorize(actor, Operation::ManageLegalEntities)?;

    let mut tx = state.store.begin().await?;
    let name = check_name_free(tx.as_mut(), name, None).await?;
    let entity = tx.insert_legal_entity(&name).await?;
    tx.commit().await?;

    tracing::info!(legal_entity_id = %entity.id, name = %entity.name, "Legal entity created");
    Ok(entity)
}

pub async fn get(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<LegalEntity> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    Ok(tx.legal_entity(id).await?.ok_or_else(|| not_found(id))?)
}

pub async fn list(state: &AppState, actor: &CurrentUser) -> ServiceResult<Vec<LegalEntity>> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    Ok(tx.list_legal_entities().await?)
}

pub async fn rename(
    state: &AppState,
    actor: &CurrentUser,
    id: Uuid,
    name: &str,
) -> ServiceResult<LegalEntity> {
    access::authorize(actor, Operation::ManageLegalEntities)?;

    let mut tx = state.store.begin().await?;
    if tx.legal_entity(id).await?.is_none() {
        return Err(not_found(id).into());
    }
    let name = check_name_free(tx.as_mut(), name, Some(id)).await?;
    let entity = tx
        .rename_legal_entity(id, &name)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(legal_entity_id = %id, name = %entity.name, "Legal entity renamed");
    Ok(entity)
}

/// Only entities that own no departments can be deleted
pub async fn delete(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<()> {
    access::authorize(actor, Operation::ManageLegalEntities)?;

    let mut tx = state.store.begin().await?;
    if tx.legal_entity(id).await?.is_none() {
        return Err(not_found(id).into());
    }
    let departments = tx.count_departments_of(id).await?;
    if departments > 0 {
        return Err(AppError::with_message(
            ErrorCode::LegalEntityInUse,
            format!("Legal entity still owns {departments} department(s)"),
        )
        .with_detail("departments", departments)
        .into());
    }
    tx.delete_legal_entity(id).await?;
    tx.commit().await?;

    tracing::info!(legal_entity_id = %id, "Legal entity deleted");
    Ok(())
}
