//! Service flows against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a server where the test user may create
//! databases: `cargo test -p staffbook-server --test postgres_store -- --ignored`

mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::{app_err, department, seed_entity, seed_user};
use shared::error::ErrorCode;
use shared::models::{
    DepartmentUpdate, ModerateRequest, ModerationDecision, ModerationStatus, Role,
};
use sqlx::PgPool;
use staffbook_server::db::PgStore;
use staffbook_server::services::avatars::{self, AvatarUpload};
use staffbook_server::services::{departments, users};
use staffbook_server::storage::MemoryStorage;
use staffbook_server::{AppState, Config};

fn pg_state(pool: PgPool) -> AppState {
    let state = AppState::new(
        &Config::for_tests(),
        Arc::new(PgStore::from_pool(pool)),
        Arc::new(MemoryStorage::new()),
    );
    state.monitors.storage.record(true);
    state
}

fn png(seed: u8) -> AvatarUpload {
    AvatarUpload {
        bytes: Bytes::from(vec![0x89, b'P', b'N', b'G', seed]),
        content_type: "image/png".into(),
        filename: Some(format!("avatar-{seed}.png")),
    }
}

fn accept() -> ModerateRequest {
    ModerateRequest {
        status: ModerationDecision::Accepted,
        rejection_reason: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_reparent_under_descendant_is_rejected(pool: PgPool) {
    let state = pg_state(pool);
    let admin = seed_user(&state, "hr@example.com", Role::HrAdmin).await;
    let acme = seed_entity(&state, "Acme").await;

    let eng = departments::create(&state, &admin, department("Eng", acme, None)).await.unwrap();
    let backend = departments::create(&state, &admin, department("Backend", acme, Some(eng.id)))
        .await
        .unwrap();
    let api = departments::create(&state, &admin, department("API", acme, Some(backend.id)))
        .await
        .unwrap();

    for target in [eng.id, backend.id, api.id] {
        let err = app_err(
            departments::update(
                &state,
                &admin,
                eng.id,
                DepartmentUpdate {
                    parent_id: Some(Some(target)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DepartmentCycle, "target {target}");
    }

    // moving a leaf across branches is fine
    let ops = departments::create(&state, &admin, department("Ops", acme, None)).await.unwrap();
    let moved = departments::update(
        &state,
        &admin,
        api.id,
        DepartmentUpdate {
            parent_id: Some(Some(ops.id)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(moved.parent_id, Some(ops.id));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_accept_demotes_previous_and_delete_falls_back(pool: PgPool) {
    let state = pg_state(pool);
    let employee = seed_user(&state, "alice@example.com", Role::Employee).await;
    let hr = seed_user(&state, "hr@example.com", Role::HrAdmin).await;

    let first = avatars::upload_and_activate(&state, &employee, employee.id, png(1), false)
        .await
        .unwrap();
    let second = avatars::upload_and_activate(&state, &employee, employee.id, png(2), false)
        .await
        .unwrap();

    avatars::moderate(&state, &hr, first.avatar_id, accept()).await.unwrap();
    avatars::moderate(&state, &hr, second.avatar_id, accept()).await.unwrap();

    let active = avatars::list_by_status(&state, &hr, ModerationStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].avatar.id, second.avatar_id);
    let accepted = avatars::list_by_status(&state, &hr, ModerationStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].avatar.id, first.avatar_id);

    avatars::delete(&state, &employee, second.avatar_id).await.unwrap();

    let view = users::get(&state, &employee, employee.id).await.unwrap();
    assert_eq!(view.current_avatar_id, Some(first.avatar_id));
    let active = avatars::list_by_status(&state, &hr, ModerationStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].avatar.id, first.avatar_id);

    // nothing accepted left to fall back to
    avatars::delete(&state, &employee, first.avatar_id).await.unwrap();
    let view = users::get(&state, &employee, employee.id).await.unwrap();
    assert_eq!(view.current_avatar_id, None);
    assert!(avatars::list_by_status(&state, &hr, ModerationStatus::Active)
        .await
        .unwrap()
        .is_empty());
}
