//! Backend liveness probe
//!
//! Runs once per session. The indicator is not refreshed afterwards.

use crate::backend::Backend;
use crate::models::HealthIndicator;
use tracing::{debug, info};

/// Label shown when the service does not name its source
pub const DEFAULT_ONLINE_LABEL: &str = "Connected";

/// Probe the backend once and turn the outcome into an indicator
pub async fn probe(backend: &dyn Backend) -> HealthIndicator {
    match backend.health().await {
        Ok(report) => {
            let label = report
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ONLINE_LABEL.to_string());
            info!(status = %report.status, %label, "Backend online at {}", backend.base_url());
            HealthIndicator::Online { label }
        }
        Err(e) => {
            debug!("Health probe failed: {}", e);
            info!("Backend offline at {}", backend.base_url());
            HealthIndicator::Offline
        }
    }
}
