//! Health command implementation

use crate::backend::Backend;
use crate::health;
use crate::models::HealthIndicator;
use serde::Serialize;

/// Backend status for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct HealthInfo {
    pub backend_url: String,
    pub indicator: HealthIndicator,
}

impl HealthInfo {
    pub fn is_online(&self) -> bool {
        matches!(self.indicator, HealthIndicator::Online { .. })
    }
}

/// Probe the backend once
pub async fn cmd_health(backend: &dyn Backend) -> HealthInfo {
    let indicator = health::probe(backend).await;
    HealthInfo {
        backend_url: backend.base_url().to_string(),
        indicator,
    }
}

/// Print backend status to console
pub fn print_health(info: &HealthInfo) {
    println!("\n🩺 paperdesk Backend\n");
    println!("URL: {}", info.backend_url);
    println!("Status: {}", info.indicator);
    if !info.is_online() {
        println!("\nStart the answering service or set backend.url in your config.");
    }
}
