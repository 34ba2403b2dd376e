mod common;

use common::{app_err, department, seed_entity, seed_user, state};
use shared::error::{ErrorCode, ErrorKind};
use shared::models::{DepartmentUpdate, Role, UserAdminUpdate};
use staffbook_server::services::{departments, users};
use staffbook_server::AppState;
use uuid::Uuid;

fn reparent(parent: Option<Uuid>) -> DepartmentUpdate {
    DepartmentUpdate {
        parent_id: Some(parent),
        ..Default::default()
    }
}

/// Follow parent links from `start`; `None` if the walk does not terminate
async fn depth(state: &AppState, start: Uuid) -> Option<usize> {
    let mut tx = state.store.begin().await.unwrap();
    let total = tx.list_departments().await.unwrap().len();
    let mut current = tx.department(start).await.unwrap();
    let mut steps = 0;
    while let Some(dept) = current {
        let Some(parent) = dept.parent_id else {
            return Some(steps);
        };
        steps += 1;
        if steps > total {
            return None;
        }
        current = tx.department(parent).await.unwrap();
    }
    Some(steps)
}

#[tokio::test]
async fn test_moving_under_descendant_is_rejected_and_tree_unchanged() {
    let state = state();
    let admin = seed_user(&state, "hr@example.com", Role::HrAdmin).await;
    let acme = seed_entity(&state, "Acme").await;

    let eng = departments::create(&state, &admin, department("Eng", acme, None)).await.unwrap();
    let backend = departments::create(&state, &admin, department("Backend", acme, Some(eng.id)))
        .await
        .unwrap();
    let api = departments::create(&state, &admin, department("API", acme, Some(backend.id)))
        .await
        .unwrap();

    for target in [backend.id, api.id] {
        let err = app_err(
            departments::update(&state, &admin, eng.id, reparent(Some(target)))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentCycle);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    }

    let eng_view = departments::get(&state, &admin, eng.id).await.unwrap();
    assert_eq!(eng_view.department.parent_id, None);
    assert_eq!(depth(&state, api.id).await, Some(2));
}

#[tokio::test]
async fn test_valid_moves_keep_the_forest_acyclic() {
    let state = state();
    let admin = seed_user(&state, "root@example.com", Role::SystemAdmin).await;
    let acme = seed_entity(&state, "Acme").await;

    let a = departments::create(&state, &admin, department("A", acme, None)).await.unwrap();
    let b = departments::create(&state, &admin, department("B", acme, None)).await.unwrap();
    let c = departments::create(&state, &admin, department("C", acme, Some(a.id))).await.unwrap();

    // B under C, then A under B would close the loop A -> C -> B -> A
    departments::update(&state, &admin, b.id, reparent(Some(c.id))).await.unwrap();
    let err = app_err(
        departments::update(&state, &admin, a.id, reparent(Some(b.id)))
            .await
            .unwrap_err(),
    );
    assert_eq!(err.code, ErrorCode::DepartmentCycle);

    // detach C, after which A under B is legal
    departments::update(&state, &admin, c.id, reparent(None)).await.unwrap();
    departments::update(&state, &admin, a.id, reparent(Some(b.id))).await.unwrap();

    for id in [a.id, b.id, c.id] {
        assert!(depth(&state, id).await.is_some());
    }
    assert_eq!(depth(&state, a.id).await, Some(2));
}

#[tokio::test]
async fn test_parent_from_other_legal_entity_is_rejected() {
    let state = state();
    let admin = seed_user(&state, "hr@example.com", Role::HrAdmin).await;
    let acme = seed_entity(&state, "Acme").await;
    let globex = seed_entity(&state, "Globex").await;

    let eng = departments::create(&state, &admin, department("Eng", acme, None)).await.unwrap();
    let sales = departments::create(&state, &admin, department("Sales", globex, None))
        .await
        .unwrap();

    let err = app_err(
        departments::update(&state, &admin, sales.id, reparent(Some(eng.id)))
            .await
            .unwrap_err(),
    );
    assert_eq!(err.code, ErrorCode::DepartmentInvalidParent);
    assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);

    let unchanged = departments::get(&state, &admin, sales.id).await.unwrap();
    assert_eq!(unchanged.department.parent_id, None);
}

#[tokio::test]
async fn test_manager_manages_at_most_one_department() {
    let state = state();
    let admin = seed_user(&state, "hr@example.com", Role::HrAdmin).await;
    let lead = seed_user(&state, "lead@example.com", Role::Employee).await;
    let acme = seed_entity(&state, "Acme").await;

    let x = departments::create(&state, &admin, department("X", acme, None)).await.unwrap();
    let y = departments::create(&state, &admin, department("Y", acme, None)).await.unwrap();

    let assign = DepartmentUpdate {
        manager_id: Some(Some(lead.id)),
        ..Default::default()
    };
    departments::update(&state, &admin, y.id, assign.clone()).await.unwrap();

    let err = app_err(
        departments::update(&state, &admin, x.id, assign.clone())
            .await
            .unwrap_err(),
    );
    assert_eq!(err.code, ErrorCode::ManagerAlreadyAssigned);
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // release Y, then X may take the manager
    departments::update(
        &state,
        &admin,
        y.id,
        DepartmentUpdate {
            manager_id: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let x = departments::update(&state, &admin, x.id, assign).await.unwrap();
    assert_eq!(x.manager_id, Some(lead.id));
}

#[tokio::test]
async fn test_delete_reports_both_counts() {
    let state = state();
    let admin = seed_user(&state, "hr@example.com", Role::HrAdmin).await;
    let worker = seed_user(&state, "worker@example.com", Role::Employee).await;
    let acme = seed_entity(&state, "Acme").await;

    let eng = departments::create(&state, &admin, department("Eng", acme, None)).await.unwrap();
    let backend = departments::create(&state, &admin, department("Backend", acme, Some(eng.id)))
        .await
        .unwrap();
    users::update(
        &state,
        &admin,
        worker.id,
        UserAdminUpdate {
            department_id: Some(Some(eng.id)),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = app_err(departments::delete(&state, &admin, eng.id).await.unwrap_err());
    assert_eq!(err.code, ErrorCode::DepartmentNotEmpty);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let details = err.details.unwrap();
    assert_eq!(details["subdepartments"], 1);
    assert_eq!(details["employees"], 1);

    // leaf without employees goes away
    departments::delete(&state, &admin, backend.id).await.unwrap();
    let err = app_err(departments::get(&state, &admin, backend.id).await.unwrap_err());
    assert_eq!(err.code, ErrorCode::DepartmentNotFound);

    // only the employee count is left
    let err = app_err(departments::delete(&state, &admin, eng.id).await.unwrap_err());
    let details = err.details.unwrap();
    assert_eq!(details["subdepartments"], 0);
    assert_eq!(details["employees"], 1);
}

#[tokio::test]
async fn test_missing_department_and_employee_access() {
    let state = state();
    let admin = seed_user(&state, "hr@example.com", Role::HrAdmin).await;
    let employee = seed_user(&state, "e@example.com", Role::Employee).await;
    let acme = seed_entity(&state, "Acme").await;

    let err = app_err(
        departments::update(&state, &admin, Uuid::new_v4(), reparent(None))
            .await
            .unwrap_err(),
    );
    assert_eq!(err.code, ErrorCode::DepartmentNotFound);

    let err = app_err(
        departments::create(&state, &employee, department("Eng", acme, None))
            .await
            .unwrap_err(),
    );
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    assert!(departments::list(&state, &employee).await.unwrap().is_empty());
}
