use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the state slot answers, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let slot = state.slot();
    if let Err(err) = slot.health_check().await {
        warn!(error = %err, "state slot health check failed");
    }

    HealthResponse::new(state.is_degraded(), slot.key(), state.viewers().len())
}
