//! Employee routes

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use shared::error::ApiResponse;
use shared::models::{SearchQuery, SetSkillsRequest, UserAdminUpdate, UserSelfUpdate, UserView};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::services::users;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/active", get(list_active))
        .route("/search", get(search))
        .route("/{id}", get(get_by_id).put(update).delete(deactivate))
        .route("/{id}/self", put(update_self))
        .route("/{id}/skills", put(set_skills))
}

async fn list_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<UserView>>> {
    Ok(Json(users::list(&state, &user, false).await?))
}

async fn list_active(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<UserView>>> {
    Ok(Json(users::list(&state, &user, true).await?))
}

async fn search(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> ServiceResult<Json<Vec<UserView>>> {
    Ok(Json(users::search(&state, &user, query).await?))
}

async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<UserView>> {
    Ok(Json(users::get(&state, &user, id).await?))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserAdminUpdate>,
) -> ServiceResult<Json<UserView>> {
    Ok(Json(users::update(&state, &user, id, payload).await?))
}

async fn update_self(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserSelfUpdate>,
) -> ServiceResult<Json<UserView>> {
    Ok(Json(users::update_self(&state, &user, id, payload).await?))
}

async fn deactivate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<ApiResponse<()>>> {
    users::deactivate(&state, &user, id).await?;
    Ok(Json(ApiResponse::ok()))
}

async fn set_skills(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetSkillsRequest>,
) -> ServiceResult<Json<UserView>> {
    Ok(Json(users::set_skills(&state, &user, id, payload.skills).await?))
}
