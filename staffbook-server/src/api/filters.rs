//! Filter option routes

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::models::FilterOptions;

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::services::filters;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/options", get(options))
}

async fn options(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<FilterOptions>> {
    Ok(Json(filters::options(&state, &user).await?))
}
