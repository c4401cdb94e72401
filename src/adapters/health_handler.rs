use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::block_registry::BlockRegistry;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub blocks: usize,
}

pub struct HealthHandler {
    registry: Arc<BlockRegistry>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self {
            registry,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            blocks: self.registry.len(),
        };

        (StatusCode::OK, Json(status))
    }
}
