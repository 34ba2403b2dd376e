//! staffbook-server binary

use shared::models::Role;
use staffbook_server::{AppState, Config, api, services};
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffbook_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting staffbook-server (env: {})", config.environment);

    let state = AppState::connect(&config).await?;

    services::auth::ensure_account(&state, &config.admin, Role::SystemAdmin, "System")
        .await
        .map_err(|e| format!("admin bootstrap failed: {:?}", e))?;
    services::auth::ensure_account(&state, &config.hr, Role::HrAdmin, "HR")
        .await
        .map_err(|e| format!("HR bootstrap failed: {:?}", e))?;

    let shutdown = CancellationToken::new();
    let monitors = state.spawn_monitors(&config, shutdown.clone());

    let app = api::create_router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("staffbook-server HTTP listening on {addr}");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutdown signal received");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    futures::future::join_all(monitors).await;
    tracing::info!("staffbook-server stopped");
    Ok(())
}
