use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::CatalogOverview,
        game::{GameView, TimerView},
        public::{HistoryResponse, ScoreboardResponse},
    },
    error::AppError,
    services::viewer_service,
    state::SharedState,
};

/// Read-only endpoints backing the audience displays.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/state", get(public_state))
        .route("/public/scoreboard", get(scoreboard))
        .route("/public/timer", get(timer))
        .route("/public/history", get(history))
        .route("/catalog", get(catalog))
        .route("/viewers/{id}/state", get(viewer_state))
}

/// Game as the default viewer shows it.
#[utoipa::path(
    get,
    path = "/public/state",
    tag = "public",
    responses((status = 200, description = "Default viewer state", body = GameView))
)]
pub async fn public_state(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(viewer_service::public_state(&state)?))
}

/// Teams ranked by score.
#[utoipa::path(
    get,
    path = "/public/scoreboard",
    tag = "public",
    responses((status = 200, description = "Scoreboard", body = ScoreboardResponse))
)]
pub async fn scoreboard(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    Ok(Json(viewer_service::scoreboard(&state)?))
}

/// Elapsed time of the current round.
#[utoipa::path(
    get,
    path = "/public/timer",
    tag = "public",
    responses((status = 200, description = "Round timer", body = TimerView))
)]
pub async fn timer(State(state): State<SharedState>) -> Result<Json<TimerView>, AppError> {
    Ok(Json(viewer_service::timer(&state)?))
}

/// Resolved rounds, oldest first.
#[utoipa::path(
    get,
    path = "/public/history",
    tag = "public",
    responses((status = 200, description = "Answer history", body = HistoryResponse))
)]
pub async fn history(State(state): State<SharedState>) -> Result<Json<HistoryResponse>, AppError> {
    Ok(Json(viewer_service::history(&state)?))
}

/// Number of examples per category and pattern count.
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "public",
    responses((status = 200, description = "Catalog overview", body = CatalogOverview))
)]
pub async fn catalog(State(state): State<SharedState>) -> Json<CatalogOverview> {
    Json(CatalogOverview::from(state.catalog()))
}

/// Game as a specific viewer shows it.
#[utoipa::path(
    get,
    path = "/viewers/{id}/state",
    tag = "viewers",
    params(("id" = Uuid, Path, description = "Viewer window")),
    responses(
        (status = 200, description = "Viewer state", body = GameView),
        (status = 404, description = "Unknown viewer")
    )
)]
pub async fn viewer_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(viewer_service::viewer_state(&state, id)?))
}
