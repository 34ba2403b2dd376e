//! Department hierarchy manager
//!
//! Keeps the department forest consistent:
//! - a parent always belongs to the same legal entity as its child
//! - a department never becomes its own ancestor
//! - a user manages at most one department
//! - only empty departments (no children, no employees) can be deleted
//!
//! Every structural check runs before the first write, and each operation
//! commits as one transaction.

use shared::error::{AppError, ErrorCode};
use shared::models::{Department, DepartmentCreate, DepartmentUpdate, DepartmentView, UserSummary};
use uuid::Uuid;

use crate::access::{self, Operation};
use crate::auth::CurrentUser;
use crate::db::Transaction;
use crate::error::ServiceResult;
use crate::state::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::new(ErrorCode::DepartmentNotFound).with_detail("department_id", id.to_string())
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "Department name must not be empty",
        ));
    }
    Ok(name.to_string())
}

/// Parent must exist and belong to `legal_entity_id`
async fn check_parent(
    tx: &mut dyn Transaction,
    parent_id: Uuid,
    legal_entity_id: Uuid,
) -> ServiceResult<Department> {
    let parent = tx
        .department(parent_id)
        .await?
        .ok_or_else(|| not_found(parent_id).with_detail("field", "parent_id"))?;
    if parent.legal_entity_id != legal_entity_id {
        return Err(AppError::new(ErrorCode::DepartmentInvalidParent)
            .with_detail("parent_id", parent_id.to_string())
            .with_detail("parent_legal_entity_id", parent.legal_entity_id.to_string())
            .with_detail("legal_entity_id", legal_entity_id.to_string())
            .into());
    }
    Ok(parent)
}

/// Name must not be taken by another department
async fn check_name_free(
    tx: &mut dyn Transaction,
    name: &str,
    own_id: Option<Uuid>,
) -> ServiceResult<()> {
    if let Some(existing) = tx.department_by_name(name).await?
        && Some(existing.id) != own_id
    {
        return Err(AppError::new(ErrorCode::DepartmentNameExists)
            .with_detail("name", name)
            .into());
    }
    Ok(())
}

pub async fn create(
    state: &AppState,
    actor: &CurrentUser,
    payload: DepartmentCreate,
) -> ServiceResult<Department> {
    access::authorize(actor, Operation::ManageDepartments)?;
    let name = validate_name(&payload.name)?;

    let mut tx = state.store.begin().await?;

    if tx.legal_entity(payload.legal_entity_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::LegalEntityNotFound)
            .with_detail("legal_entity_id", payload.legal_entity_id.to_string())
            .into());
    }
    check_name_free(tx.as_mut(), &name, None).await?;
    if let Some(parent_id) = payload.parent_id {
        check_parent(tx.as_mut(), parent_id, payload.legal_entity_id).await?;
    }

    let dept = tx
        .insert_department(&DepartmentCreate {
            name,
            ..payload
        })
        .await?;
    tx.commit().await?;

    tracing::info!(
        department_id = %dept.id,
        name = %dept.name,
        parent_id = ?dept.parent_id,
        "Department created"
    );
    Ok(dept)
}

pub async fn update(
    state: &AppState,
    actor: &CurrentUser,
    id: Uuid,
    mut changes: DepartmentUpdate,
) -> ServiceResult<Department> {
    access::authorize(actor, Operation::ManageDepartments)?;
    if let Some(name) = changes.name.take() {
        changes.name = Some(validate_name(&name)?);
    }

    let mut tx = state.store.begin().await?;

    let dept = tx.department(id).await?.ok_or_else(|| not_found(id))?;

    if let Some(name) = &changes.name {
        check_name_free(tx.as_mut(), name, Some(id)).await?;
    }

    if let Some(Some(parent_id)) = changes.parent_id {
        check_parent(tx.as_mut(), parent_id, dept.legal_entity_id).await?;
        // the new parent must not sit inside the subtree being moved
        if tx.is_descendant(parent_id, id).await? {
            tracing::warn!(
                department_id = %id,
                parent_id = %parent_id,
                "Rejected cyclic department move"
            );
            return Err(AppError::new(ErrorCode::DepartmentCycle)
                .with_detail("department_id", id.to_string())
                .with_detail("parent_id", parent_id.to_string())
                .into());
        }
    }

    if let Some(Some(manager_id)) = changes.manager_id {
        if tx.user(manager_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::EmployeeNotFound)
                .with_detail("manager_id", manager_id.to_string())
                .into());
        }
        if let Some(managed) = tx.managed_department(manager_id).await?
            && managed.id != id
        {
            return Err(AppError::new(ErrorCode::ManagerAlreadyAssigned)
                .with_detail("manager_id", manager_id.to_string())
                .with_detail("managed_department_id", managed.id.to_string())
                .into());
        }
    }

    let updated = tx
        .update_department(id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(department_id = %id, "Department updated");
    Ok(updated)
}

pub async fn delete(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<()> {
    access::authorize(actor, Operation::ManageDepartments)?;

    let mut tx = state.store.begin().await?;

    if tx.department(id).await?.is_none() {
        return Err(not_found(id).into());
    }

    let subdepartments = tx.count_subdepartments(id).await?;
    let employees = tx.count_employees(id).await?;
    if subdepartments > 0 || employees > 0 {
        return Err(AppError::with_message(
            ErrorCode::DepartmentNotEmpty,
            format!(
                "Department has {subdepartments} subdepartment(s) and {employees} employee(s)"
            ),
        )
        .with_detail("subdepartments", subdepartments)
        .with_detail("employees", employees)
        .into());
    }

    tx.delete_department(id).await?;
    tx.commit().await?;

    tracing::info!(department_id = %id, "Department deleted");
    Ok(())
}

async fn view(tx: &mut dyn Transaction, department: Department) -> ServiceResult<DepartmentView> {
    let manager = match department.manager_id {
        Some(manager_id) => tx.user(manager_id).await?.as_ref().map(UserSummary::from),
        None => None,
    };
    let employees = tx
        .users_in_department(department.id)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();
    let subdepartments = tx.subdepartments(department.id).await?;

    Ok(DepartmentView {
        department,
        manager,
        employees,
        subdepartments,
    })
}

pub async fn get(state: &AppState, actor: &CurrentUser, id: Uuid) -> ServiceResult<DepartmentView> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    let dept = tx.department(id).await?.ok_or_else(|| not_found(id))?;
    view(tx.as_mut(), dept).await
}

pub async fn list(state: &AppState, actor: &CurrentUser) -> ServiceResult<Vec<DepartmentView>> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    let departments = tx.list_departments().await?;
    let mut views = Vec::with_capacity(departments.len());
    for dept in departments {
        views.push(view(tx.as_mut(), dept).await?);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::app_error;
    use shared::error::ErrorKind;
    use shared::models::{NewUser, Role};

    fn admin() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "hr@example.com".into(),
            role: Role::HrAdmin,
        }
    }

    async fn seed_entity(state: &AppState, name: &str) -> Uuid {
        let mut tx = state.store.begin().await.unwrap();
        let entity = tx.insert_legal_entity(name).await.unwrap();
        tx.commit().await.unwrap();
        entity.id
    }

    async fn seed_user(state: &AppState, email: &str) -> Uuid {
        let mut tx = state.store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewUser {
                first_name: "Test".into(),
                last_name: "User".into(),
                email: email.into(),
                password_hash: "x".into(),
                role: Role::Employee,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user.id
    }

    fn payload(name: &str, entity: Uuid, parent: Option<Uuid>) -> DepartmentCreate {
        DepartmentCreate {
            name: name.into(),
            legal_entity_id: entity,
            parent_id: parent,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_parent_of_other_entity() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let globex = seed_entity(&state, "Globex").await;
        let eng = create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();

        let err = app_error(
            create(&state, &admin(), payload("Ops", globex, Some(eng.id)))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentInvalidParent);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_create_with_missing_parent() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let err = app_error(
            create(&state, &admin(), payload("Eng", acme, Some(Uuid::new_v4())))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentNotFound);
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();
        let err = app_error(
            create(&state, &admin(), payload(" Eng ", acme, None))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentNameExists);
    }

    #[tokio::test]
    async fn test_self_parent_is_a_cycle() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let eng = create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();

        let err = app_error(
            update(
                &state,
                &admin(),
                eng.id,
                DepartmentUpdate {
                    parent_id: Some(Some(eng.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentCycle);
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_detach_parent_with_null() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let eng = create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();
        let backend = create(&state, &admin(), payload("Backend", acme, Some(eng.id)))
            .await
            .unwrap();

        let moved = update(
            &state,
            &admin(),
            backend.id,
            DepartmentUpdate {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.parent_id, None);
    }

    #[tokio::test]
    async fn test_reassigning_same_manager_is_allowed() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let lead = seed_user(&state, "lead@example.com").await;
        let eng = create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();

        let set_manager = DepartmentUpdate {
            manager_id: Some(Some(lead)),
            ..Default::default()
        };
        update(&state, &admin(), eng.id, set_manager.clone()).await.unwrap();
        let again = update(&state, &admin(), eng.id, set_manager).await.unwrap();
        assert_eq!(again.manager_id, Some(lead));
    }

    #[tokio::test]
    async fn test_unknown_manager() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let eng = create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();
        let err = app_error(
            update(
                &state,
                &admin(),
                eng.id,
                DepartmentUpdate {
                    manager_id: Some(Some(Uuid::new_v4())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::EmployeeNotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_view_includes_manager_and_children() {
        let state = AppState::in_memory(&Config::for_tests());
        let acme = seed_entity(&state, "Acme").await;
        let lead = seed_user(&state, "lead@example.com").await;
        let eng = create(&state, &admin(), payload("Eng", acme, None)).await.unwrap();
        create(&state, &admin(), payload("Backend", acme, Some(eng.id)))
            .await
            .unwrap();
        update(
            &state,
            &admin(),
            eng.id,
            DepartmentUpdate {
                manager_id: Some(Some(lead)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let view = get(&state, &admin(), eng.id).await.unwrap();
        assert_eq!(view.manager.map(|m| m.id), Some(lead));
        assert_eq!(view.subdepartments.len(), 1);
        assert_eq!(view.subdepartments[0].name, "Backend");
        assert!(view.employees.is_empty());

        assert_eq!(list(&state, &admin()).await.unwrap().len(), 2);
    }
}
