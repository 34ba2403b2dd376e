//! HTTP API
//!
//! Every route except `/health` and the public auth endpoints requires a
//! bearer access token (see [`CurrentUser`](crate::auth::CurrentUser)).

pub mod auth;
pub mod avatars;
pub mod departments;
pub mod employees;
pub mod filters;
pub mod health;
pub mod legal_entities;
pub mod skills;
pub mod upload_limit;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/employees", employees::router().merge(avatars::router()))
        .nest("/departments", departments::router())
        .nest("/legal-entities", legal_entities::router())
        .nest("/skills", skills::router())
        .nest("/filters", filters::router());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.max_upload_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            upload_limit::reject_oversized,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
