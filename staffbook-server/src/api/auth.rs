//! Auth routes

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::models::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserView};

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ServiceResult<Json<TokenResponse>> {
    Ok(Json(services::auth::register(&state, payload).await?))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ServiceResult<Json<TokenResponse>> {
    Ok(Json(services::auth::login(&state, payload).await?))
}

async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ServiceResult<Json<TokenResponse>> {
    Ok(Json(
        services::auth::refresh(&state, &payload.refresh_token).await?,
    ))
}

async fn me(State(state): State<AppState>, user: CurrentUser) -> ServiceResult<Json<UserView>> {
    Ok(Json(services::auth::me(&state, &user).await?))
}
