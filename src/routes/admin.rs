use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            SelectCategoryRequest, SelectPatternCountRequest, SetTeamsRequest,
            ShowExampleResponse, ViewerLaunchResponse,
        },
        game::GameView,
    },
    error::AppError,
    services::{admin_service, viewer_service},
    state::SharedState,
};

/// Moderator endpoints driving the control window.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/state", get(get_state))
        .route("/admin/teams", put(set_teams))
        .route("/admin/round/category", post(select_category))
        .route("/admin/round/pattern-count", post(select_pattern_count))
        .route(
            "/admin/round/example",
            post(show_example).delete(clear_example),
        )
        .route("/admin/round/reveal", post(reveal))
        .route("/admin/round/award/{team_id}", post(award))
        .route("/admin/round/skip", post(skip))
        .route("/admin/round/pause", post(toggle_pause))
        .route("/admin/game/reset", post(reset))
        .route("/admin/viewers", get(list_viewers).post(open_viewer))
        .route("/admin/viewers/{id}", delete(close_viewer))
}

/// Current game as the control window shows it, solution included.
#[utoipa::path(
    get,
    path = "/admin/state",
    tag = "admin",
    responses((status = 200, description = "Control window state", body = GameView))
)]
pub async fn get_state(State(state): State<SharedState>) -> Json<GameView> {
    Json(admin_service::current_state(&state))
}

/// Replace the teams of the current game.
#[utoipa::path(
    put,
    path = "/admin/teams",
    tag = "admin",
    request_body = SetTeamsRequest,
    responses(
        (status = 200, description = "Teams replaced", body = GameView),
        (status = 400, description = "Invalid roster")
    )
)]
pub async fn set_teams(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SetTeamsRequest>>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::set_teams(&state, payload).await?))
}

/// Select the category of the next example.
#[utoipa::path(
    post,
    path = "/admin/round/category",
    tag = "admin",
    request_body = SelectCategoryRequest,
    responses((status = 200, description = "Category selected", body = GameView))
)]
pub async fn select_category(
    State(state): State<SharedState>,
    Json(payload): Json<SelectCategoryRequest>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::select_category(&state, payload).await?))
}

/// Select how many patterns the next example uses.
#[utoipa::path(
    post,
    path = "/admin/round/pattern-count",
    tag = "admin",
    request_body = SelectPatternCountRequest,
    responses(
        (status = 200, description = "Pattern count selected", body = GameView),
        (status = 400, description = "Pattern count outside 1..=3")
    )
)]
pub async fn select_pattern_count(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SelectPatternCountRequest>>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(
        admin_service::select_pattern_count(&state, payload).await?,
    ))
}

/// Show a random unused example matching the selected filters.
#[utoipa::path(
    post,
    path = "/admin/round/example",
    tag = "admin",
    responses(
        (status = 200, description = "Example shown", body = ShowExampleResponse),
        (status = 409, description = "Filters missing or no unused example left")
    )
)]
pub async fn show_example(
    State(state): State<SharedState>,
) -> Result<Json<ShowExampleResponse>, AppError> {
    Ok(Json(admin_service::show_example(&state).await?))
}

/// Take the current example off screen.
#[utoipa::path(
    delete,
    path = "/admin/round/example",
    tag = "admin",
    responses((status = 200, description = "Example cleared", body = GameView))
)]
pub async fn clear_example(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::clear_example(&state).await?))
}

/// Reveal the solution of the current example.
#[utoipa::path(
    post,
    path = "/admin/round/reveal",
    tag = "admin",
    responses(
        (status = 200, description = "Solution revealed", body = GameView),
        (status = 409, description = "No example on screen")
    )
)]
pub async fn reveal(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::reveal(&state).await?))
}

/// Award the point to a team and start the next round.
#[utoipa::path(
    post,
    path = "/admin/round/award/{team_id}",
    tag = "admin",
    params(("team_id" = Uuid, Path, description = "Team receiving the point")),
    responses(
        (status = 200, description = "Point awarded", body = GameView),
        (status = 409, description = "No round running or unknown team")
    )
)]
pub async fn award(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::award(&state, team_id).await?))
}

/// Start the next round without awarding a point.
#[utoipa::path(
    post,
    path = "/admin/round/skip",
    tag = "admin",
    responses((status = 200, description = "Round skipped", body = GameView))
)]
pub async fn skip(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::skip(&state).await?))
}

/// Pause or resume the round timer.
#[utoipa::path(
    post,
    path = "/admin/round/pause",
    tag = "admin",
    responses((status = 200, description = "Pause toggled", body = GameView))
)]
pub async fn toggle_pause(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::toggle_pause(&state).await?))
}

/// Start a new game from scratch.
#[utoipa::path(
    post,
    path = "/admin/game/reset",
    tag = "admin",
    responses((status = 200, description = "Game reset", body = GameView))
)]
pub async fn reset(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(admin_service::reset(&state).await?))
}

/// List open viewer windows.
#[utoipa::path(
    get,
    path = "/admin/viewers",
    tag = "viewers",
    responses((status = 200, description = "Open viewers", body = [ViewerLaunchResponse]))
)]
pub async fn list_viewers(State(state): State<SharedState>) -> Json<Vec<ViewerLaunchResponse>> {
    Json(viewer_service::list_viewers(&state))
}

/// Open an additional viewer window.
#[utoipa::path(
    post,
    path = "/admin/viewers",
    tag = "viewers",
    responses((status = 201, description = "Viewer opened", body = ViewerLaunchResponse))
)]
pub async fn open_viewer(
    State(state): State<SharedState>,
) -> (StatusCode, Json<ViewerLaunchResponse>) {
    (
        StatusCode::CREATED,
        Json(viewer_service::open_viewer(&state).await),
    )
}

/// Close a viewer window.
#[utoipa::path(
    delete,
    path = "/admin/viewers/{id}",
    tag = "viewers",
    params(("id" = Uuid, Path, description = "Viewer to close")),
    responses(
        (status = 204, description = "Viewer closed"),
        (status = 404, description = "Unknown viewer"),
        (status = 409, description = "The default viewer cannot be closed")
    )
)]
pub async fn close_viewer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    viewer_service::close_viewer(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}
