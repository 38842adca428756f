//! API Response Types

use serde::Serialize;

/// Informational response for the root route
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
}

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub connections: usize,
    pub rooms: usize,
}
