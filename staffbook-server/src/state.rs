//! Application state

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{JwtConfig, JwtService};
use crate::config::Config;
use crate::db::{MemoryStore, PgStore, Store};
use crate::health::{self, Monitors};
use crate::storage::{MemoryStorage, ObjectStorage, S3Storage};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Relational store
    pub store: Arc<dyn Store>,
    /// Blob store for avatar images
    pub storage: Arc<dyn ObjectStorage>,
    pub jwt: JwtService,
    pub monitors: Monitors,
    /// Bucket holding avatar blobs
    pub avatar_bucket: String,
    /// Upload ceiling in bytes
    pub max_upload_size: usize,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>, storage: Arc<dyn ObjectStorage>) -> Self {
        let jwt = JwtService::new(JwtConfig {
            secret: config.jwt_secret.clone(),
            algorithm: config.jwt_algorithm,
            access_expire_minutes: config.access_token_expire_minutes,
            refresh_expire_days: config.refresh_token_expire_days,
        });

        Self {
            store,
            storage,
            jwt,
            monitors: Monitors::new(),
            avatar_bucket: config.avatar_bucket.clone(),
            max_upload_size: config.max_upload_size,
        }
    }

    /// Production wiring: PostgreSQL (migrated) and S3
    pub async fn connect(config: &Config) -> Result<Self, BoxError> {
        let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
        tracing::info!("Database ready");

        let storage = S3Storage::new(&config.s3).await;
        Ok(Self::new(config, Arc::new(store), Arc::new(storage)))
    }

    /// In-process wiring with every dependency marked healthy
    pub fn in_memory(config: &Config) -> Self {
        let state = Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStorage::new()),
        );
        state.monitors.storage.record(true);
        state.monitors.monitoring.record(true);
        state
    }

    /// Start the storage and monitoring probes; they stop when `shutdown` is cancelled
    pub fn spawn_monitors(
        &self,
        config: &Config,
        shutdown: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let interval = Duration::from_secs(config.health_check_interval_secs.max(1));

        let storage = self.storage.clone();
        let bucket = self.avatar_bucket.clone();
        let storage_loop = self.monitors.storage.clone().run(
            interval,
            shutdown.clone(),
            move || health::probe_storage(storage.clone(), bucket.clone()),
        );

        let client = reqwest::Client::new();
        let url = health::monitoring_url(&config.monitoring_host, config.monitoring_port);
        let monitoring_loop = self.monitors.monitoring.clone().run(
            interval,
            shutdown,
            move || health::probe_http(client.clone(), url.clone()),
        );

        vec![tokio::spawn(storage_loop), tokio::spawn(monitoring_loop)]
    }
}
