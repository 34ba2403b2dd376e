//! Skill routes

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use shared::error::ApiResponse;
use shared::models::{Skill, SkillCreate, SkillUpdate};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::services::skills;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).patch(rename).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<Skill>>> {
    Ok(Json(skills::list(&state, &user).await?))
}

async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<Skill>> {
    Ok(Json(skills::get(&state, &user, id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SkillCreate>,
) -> ServiceResult<Json<Skill>> {
    Ok(Json(
        skills::create(&state, &user, &payload.name).await?,
    ))
}

async fn rename(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SkillUpdate>,
) -> ServiceResult<Json<Skill>> {
    Ok(Json(
        skills::rename(&state, &user, id, &payload.name).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<ApiResponse<()>>> {
    skills::delete(&state, &user, id).await?;
    Ok(Json(ApiResponse::ok()))
}
