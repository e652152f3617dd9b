use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Key of the shared state slot.
    pub slot: String,
    /// Number of open viewer windows.
    pub viewers: usize,
}

impl HealthResponse {
    /// Create a health response for a reachable or failing slot.
    pub fn new(degraded: bool, slot: &str, viewers: usize) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" }.to_string(),
            slot: slot.to_string(),
            viewers,
        }
    }
}
