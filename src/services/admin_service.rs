//! Business logic powering the moderator REST routes. Every intent goes
//! through the round controller, so transitions are applied one at a time on
//! the control window and published before the response is built.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    catalog::PatternCount,
    dto::{
        admin::{
            SelectCategoryRequest, SelectPatternCountRequest, SetTeamsRequest, ShowExampleResponse,
        },
        common::ExampleView,
        game::GameView,
    },
    error::ServiceError,
    services::{sse_events, timer::next_display},
    state::{
        SharedState,
        game::{GameState, Team, TeamColor},
    },
    sync::WindowRole,
};

/// Project `state` as the control window shows it.
fn control_view(state: &SharedState, game: &GameState) -> GameView {
    let control = state.control();
    let timer = next_display(
        &control.timer().current(),
        game,
        state.clock().now_millis(),
    );
    GameView::new(
        control.window().id(),
        WindowRole::Control,
        game,
        timer,
        state.is_degraded(),
    )
}

/// Current game as seen by the moderator.
pub fn current_state(state: &SharedState) -> GameView {
    control_view(state, &state.control().window().state())
}

/// Replace the teams. Teams without a color get the first unused configured one.
pub async fn set_teams(
    state: &SharedState,
    request: SetTeamsRequest,
) -> Result<GameView, ServiceError> {
    let mut teams: Vec<Team> = Vec::with_capacity(request.teams.len());
    for input in request.teams {
        let name = input.name.trim().to_string();
        if teams.iter().any(|team| team.name.eq_ignore_ascii_case(&name)) {
            return Err(ServiceError::InvalidInput(format!(
                "duplicate team name `{name}`"
            )));
        }

        let color = match input.color {
            Some(color) => TeamColor::from(color),
            None => {
                let used = teams.iter().map(|team| team.color).collect::<Vec<_>>();
                state.config().first_unused_color(&used)
            }
        };
        teams.push(Team::new(name, color));
    }

    let count = teams.len();
    let game = state.controller().set_teams(teams).await?;
    info!(teams = count, "teams updated");
    Ok(control_view(state, &game))
}

/// Record the category filter for the next example.
pub async fn select_category(
    state: &SharedState,
    request: SelectCategoryRequest,
) -> Result<GameView, ServiceError> {
    let game = state.controller().select_category(request.category).await?;
    Ok(control_view(state, &game))
}

/// Record the pattern-count filter for the next example.
pub async fn select_pattern_count(
    state: &SharedState,
    request: SelectPatternCountRequest,
) -> Result<GameView, ServiceError> {
    let count = PatternCount::new(request.pattern_count)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let game = state.controller().select_pattern_count(count).await?;
    Ok(control_view(state, &game))
}

/// Put a random unused example matching the filters on screen.
pub async fn show_example(state: &SharedState) -> Result<ShowExampleResponse, ServiceError> {
    match state.controller().show_example().await {
        Ok(shown) => {
            debug!(example = %shown.example.id, remaining = shown.remaining, "example shown");
            Ok(ShowExampleResponse {
                example: ExampleView::new(&shown.example, true),
                remaining: shown.remaining,
            })
        }
        Err(err @ ServiceError::CatalogExhausted) => {
            sse_events::broadcast_admin_notice(state, &err.to_string());
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Take the current example off screen without resolving the round.
pub async fn clear_example(state: &SharedState) -> Result<GameView, ServiceError> {
    let game = state.controller().clear_example().await?;
    Ok(control_view(state, &game))
}

/// Reveal the solution of the example on screen.
pub async fn reveal(state: &SharedState) -> Result<GameView, ServiceError> {
    let game = state.controller().reveal().await?;
    Ok(control_view(state, &game))
}

/// Give the point to `team_id` and move to the next round.
pub async fn award(state: &SharedState, team_id: Uuid) -> Result<GameView, ServiceError> {
    let game = state.controller().award(team_id).await?;
    if let Some(team) = game.team(team_id) {
        info!(team = %team.name, score = team.score, round = game.round_number(), "point awarded");
        sse_events::broadcast_public_notice(state, &format!("{} scores a point", team.name));
    }
    Ok(control_view(state, &game))
}

/// Move to the next round without awarding anything.
pub async fn skip(state: &SharedState) -> Result<GameView, ServiceError> {
    let game = state.controller().skip().await?;
    Ok(control_view(state, &game))
}

/// Freeze or unfreeze the round timer.
pub async fn toggle_pause(state: &SharedState) -> Result<GameView, ServiceError> {
    let game = state.controller().toggle_pause().await?;
    Ok(control_view(state, &game))
}

/// Start a brand new game.
pub async fn reset(state: &SharedState) -> Result<GameView, ServiceError> {
    let game = state.controller().reset().await?;
    info!("game reset");
    sse_events::broadcast_public_notice(state, "a new game is starting");
    Ok(control_view(state, &game))
}
