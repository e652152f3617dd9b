//! Read-only projections for the audience windows, plus opening and closing
//! extra viewers.

use tracing::debug;

use crate::{
    dto::{
        admin::ViewerLaunchResponse,
        game::{GameView, TimerView},
        public::{HistoryResponse, ScoreboardResponse},
    },
    error::ServiceError,
    state::{SharedState, WindowEntry},
    sync::WindowId,
};

fn launch_response(state: &SharedState, entry: &WindowEntry) -> ViewerLaunchResponse {
    let id = entry.window().id();
    let size = state.config().viewer();
    ViewerLaunchResponse {
        id,
        url: format!("/viewers/{id}/state"),
        stream_url: format!("/sse/viewers/{id}"),
        width: size.width,
        height: size.height,
        is_default: id == state.default_viewer_id(),
    }
}

/// Game as one window currently displays it.
pub fn window_view(state: &SharedState, entry: &WindowEntry) -> GameView {
    let window = entry.window();
    GameView::new(
        window.id(),
        window.role(),
        &window.state(),
        entry.timer().current(),
        state.is_degraded(),
    )
}

/// Open an extra audience window.
pub async fn open_viewer(state: &SharedState) -> ViewerLaunchResponse {
    let entry = state.open_viewer().await;
    launch_response(state, &entry)
}

/// Close an extra audience window.
pub fn close_viewer(state: &SharedState, id: WindowId) -> Result<(), ServiceError> {
    state.close_viewer(id)
}

/// Every open audience window, default first.
pub fn list_viewers(state: &SharedState) -> Vec<ViewerLaunchResponse> {
    state
        .viewers()
        .iter()
        .map(|entry| launch_response(state, entry))
        .collect()
}

/// Game as seen by a specific viewer.
pub fn viewer_state(state: &SharedState, id: WindowId) -> Result<GameView, ServiceError> {
    let entry = state.viewer(id)?;
    Ok(window_view(state, &entry))
}

/// Game as seen by the default viewer.
pub fn public_state(state: &SharedState) -> Result<GameView, ServiceError> {
    let entry = state.default_viewer()?;
    Ok(window_view(state, &entry))
}

/// Teams ranked by score, as the default viewer knows them.
pub fn scoreboard(state: &SharedState) -> Result<ScoreboardResponse, ServiceError> {
    let entry = state.default_viewer()?;
    Ok(ScoreboardResponse::from(&entry.window().state()))
}

/// Elapsed round time shown by the default viewer.
pub fn timer(state: &SharedState) -> Result<TimerView, ServiceError> {
    let entry = state.default_viewer()?;
    Ok(entry.timer().current().into())
}

/// Resolved rounds, oldest first.
pub fn history(state: &SharedState) -> Result<HistoryResponse, ServiceError> {
    let entry = state.default_viewer()?;
    let game = entry.window().state();
    debug!(entries = game.answer_history().len(), "history requested");
    Ok(HistoryResponse::from(&game))
}
