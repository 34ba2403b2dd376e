#![allow(dead_code)]

use shared::error::AppError;
use shared::models::{DepartmentCreate, NewUser, Role};
use staffbook_server::auth::CurrentUser;
use staffbook_server::{AppState, Config, ServiceError};
use uuid::Uuid;

pub fn state() -> AppState {
    AppState::in_memory(&Config::for_tests())
}

pub fn app_err(e: ServiceError) -> AppError {
    AppError::from(e)
}

pub async fn seed_user(state: &AppState, email: &str, role: Role) -> CurrentUser {
    let mut tx = state.store.begin().await.unwrap();
    let user = tx
        .insert_user(&NewUser {
            first_name: "Test".into(),
            last_name: email.split('@').next().unwrap_or("user").into(),
            email: email.into(),
            password_hash: "unused".into(),
            role,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    CurrentUser::from(&user)
}

pub async fn seed_entity(state: &AppState, name: &str) -> Uuid {
    let mut tx = state.store.begin().await.unwrap();
    let entity = tx.insert_legal_entity(name).await.unwrap();
    tx.commit().await.unwrap();
    entity.id
}

pub fn department(name: &str, legal_entity_id: Uuid, parent_id: Option<Uuid>) -> DepartmentCreate {
    DepartmentCreate {
        name: name.into(),
        legal_entity_id,
        parent_id,
    }
}
