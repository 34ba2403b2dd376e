//! Health check endpoint

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = state.store.ping().await.is_ok();
    let storage = state.monitors.storage.snapshot();
    let monitoring = state.monitors.monitoring.snapshot();
    let status = if database && storage.healthy { "ok" } else { "degraded" };

    Json(serde_json::json!({
        "status": status,
        "service": "staffbook-server",
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "database": { "healthy": database },
            "storage": storage,
            "monitoring": monitoring,
        },
    }))
}
