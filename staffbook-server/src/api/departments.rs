//! Department routes

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use shared::error::ApiResponse;
use shared::models::{Department, DepartmentCreate, DepartmentUpdate, DepartmentView};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::services::departments;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<DepartmentView>>> {
    Ok(Json(departments::list(&state, &user).await?))
}

async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<DepartmentView>> {
    Ok(Json(departments::get(&state, &user, id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<DepartmentCreate>,
) -> ServiceResult<Json<Department>> {
    Ok(Json(departments::create(&state, &user, payload).await?))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentUpdate>,
) -> ServiceResult<Json<Department>> {
    Ok(Json(departments::update(&state, &user, id, payload).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<ApiResponse<()>>> {
    departments::delete(&state, &user, id).await?;
    Ok(Json(ApiResponse::ok()))
}
