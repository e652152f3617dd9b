use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{services::sse_events, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Watch the state slot and keep the shared state in degraded mode while it
/// is unreachable. Once it answers again the control window republishes its
/// state so every viewer catches up.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;

    loop {
        match state.slot().health_check().await {
            Ok(()) => {
                delay = INITIAL_DELAY;
                if state.is_degraded() {
                    recover(&state).await;
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                if state.update_degraded(true) {
                    warn!(error = %err, "state slot unreachable; entering degraded mode");
                    sse_events::broadcast_admin_notice(
                        &state,
                        "state slot unreachable; viewers may show a stale game",
                    );
                } else {
                    warn!(error = %err, retry_in = ?delay, "state slot still unreachable");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

async fn recover(state: &SharedState) {
    match state.controller().republish().await {
        Ok(()) => {
            state.update_degraded(false);
            info!("state slot healthy again; leaving degraded mode");
            sse_events::broadcast_admin_notice(state, "state slot reachable again");
        }
        Err(err) => warn!(error = %err, "state slot answered but republishing failed"),
    }
}
