//! Dependency health monitors
//!
//! Each monitor owns one boolean flag. A background loop started at boot is
//! the only writer; request handlers read the flag and fail fast with
//! `ServiceUnavailable` while a dependency is marked down. The loops stop
//! when the shutdown token is cancelled.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use serde::Serialize;
use shared::error::AppError;
use shared::util::now_millis;
use tokio_util::sync::CancellationToken;

use crate::storage::ObjectStorage;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Health flag for one external dependency
#[derive(Debug)]
pub struct HealthMonitor {
    name: &'static str,
    status: AtomicBool,
    last_check: AtomicI64,
}

/// Point-in-time view of a monitor
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub healthy: bool,
    /// Epoch millis of the last probe, `None` before the first one
    pub last_check: Option<i64>,
}

impl HealthMonitor {
    /// New monitor, marked down until its first successful probe
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            status: AtomicBool::new(false),
            last_check: AtomicI64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_healthy(&self) -> bool {
        self.status.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last = self.last_check.load(Ordering::Acquire);
        HealthSnapshot {
            healthy: self.is_healthy(),
            last_check: (last > 0).then_some(last),
        }
    }

    /// `Err(ServiceUnavailable)` while the dependency is down
    pub fn ensure_available(&self) -> Result<(), AppError> {
        if self.is_healthy() {
            Ok(())
        } else {
            Err(AppError::service_unavailable(self.name))
        }
    }

    /// Record a probe result, logging status flips
    pub fn record(&self, healthy: bool) {
        self.last_check.store(now_millis(), Ordering::Release);
        let previous = self.status.swap(healthy, Ordering::AcqRel);
        if previous != healthy {
            if healthy {
                tracing::info!(service = self.name, "Dependency is up");
            } else {
                tracing::warn!(service = self.name, "Dependency is down");
            }
        }
    }

    /// Probe immediately, then every `interval` until `shutdown` is cancelled
    pub async fn run<F, Fut>(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
        mut probe: F,
    ) where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = bool> + Send,
    {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!(service = self.name, "Health monitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let healthy = probe().await;
                    self.record(healthy);
                }
            }
        }
    }
}

/// Storage probe: backend reachable and bucket accessible
pub async fn probe_storage(storage: Arc<dyn ObjectStorage>, bucket: String) -> bool {
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT * 2, storage.health_check(&bucket)).await,
        Ok(true)
    )
}

/// Monitoring probe: `GET {url}` answers with a success status
pub async fn probe_http(client: reqwest::Client, url: String) -> bool {
    match client.get(&url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Monitoring probe failed");
            false
        }
    }
}

/// Readiness URL of the monitoring endpoint
pub fn monitoring_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}/-/ready")
}

/// Dependency monitors shared through the application state
#[derive(Debug, Clone)]
pub struct Monitors {
    pub storage: Arc<HealthMonitor>,
    pub monitoring: Arc<HealthMonitor>,
}

impl Monitors {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(HealthMonitor::new("storage")),
            monitoring: Arc::new(HealthMonitor::new("monitoring")),
        }
    }
}

impl Default for Monitors {
    fn default() -> Self {
        Self::new()
    }
}
