use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::CategoryFilter,
    dto::{
        common::{ExampleView, TeamSummary},
        format_timestamp,
    },
    services::timer::TimerDisplay,
    state::{game::GameState, phase::RoundPhase},
    sync::WindowRole,
};

/// Round phase as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseView {
    /// Waiting for filters and an example.
    Setup,
    /// An example is on screen.
    ExampleShown,
    /// The solution is visible.
    SolutionRevealed,
}

impl From<RoundPhase> for PhaseView {
    fn from(phase: RoundPhase) -> Self {
        match phase {
            RoundPhase::Setup => PhaseView::Setup,
            RoundPhase::ExampleShown => PhaseView::ExampleShown,
            RoundPhase::SolutionRevealed => PhaseView::SolutionRevealed,
        }
    }
}

/// Elapsed round time as shown by a window.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimerView {
    /// RFC 3339 time the current example appeared.
    pub round_started_at: Option<String>,
    pub elapsed_seconds: Option<u64>,
    pub is_paused: bool,
}

impl From<TimerDisplay> for TimerView {
    fn from(display: TimerDisplay) -> Self {
        Self {
            round_started_at: display.round_start_time.map(format_timestamp),
            elapsed_seconds: display.elapsed_seconds,
            is_paused: display.is_paused,
        }
    }
}

/// Everything a surface needs to render the game as one window sees it.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameView {
    pub window_id: Uuid,
    pub role: WindowRole,
    pub phase: PhaseView,
    pub round_number: u32,
    /// Teams in setup order.
    pub teams: Vec<TeamSummary>,
    pub current_example: Option<ExampleView>,
    pub solution_revealed: bool,
    pub selected_category: Option<CategoryFilter>,
    pub selected_pattern_count: Option<u8>,
    pub used_examples: usize,
    pub rounds_resolved: usize,
    pub timer: TimerView,
    /// True while the state slot is failing; the view may be stale.
    pub degraded: bool,
}

impl GameView {
    /// Project `state` for a window. The control window always sees the
    /// solution, viewers only once it is revealed.
    pub fn new(
        window_id: Uuid,
        role: WindowRole,
        state: &GameState,
        timer: TimerDisplay,
        degraded: bool,
    ) -> Self {
        let with_solution = role == WindowRole::Control || state.solution_revealed();
        Self {
            window_id,
            role,
            phase: RoundPhase::of(state).into(),
            round_number: state.round_number(),
            teams: state.teams().iter().map(TeamSummary::from).collect(),
            current_example: state
                .current_example()
                .map(|example| ExampleView::new(example, with_solution)),
            solution_revealed: state.solution_revealed(),
            selected_category: state.selected_category(),
            selected_pattern_count: state.selected_pattern_count().map(|count| count.get()),
            used_examples: state.used_example_ids().len(),
            rounds_resolved: state.answer_history().len(),
            timer: timer.into(),
            degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, PatternExample};

    fn shown_state() -> GameState {
        let mut state = GameState::new();
        let _ = state.set_current_example(
            Some(PatternExample {
                id: "structural-03".into(),
                title: "Remote image".into(),
                category: Category::Structural,
                code: "class ImageProxy {}".into(),
                solution_patterns: vec!["Proxy".into()],
                solution_explanation: "stands in".into(),
            }),
            0,
        );
        state
    }

    #[test]
    fn viewers_only_see_revealed_solutions() {
        let mut state = shown_state();
        let view = GameView::new(
            Uuid::nil(),
            WindowRole::Viewer,
            &state,
            TimerDisplay::default(),
            false,
        );
        assert_eq!(view.phase, PhaseView::ExampleShown);
        assert!(view.current_example.unwrap().solution.is_none());

        let _ = state.reveal_solution();
        let view = GameView::new(
            Uuid::nil(),
            WindowRole::Viewer,
            &state,
            TimerDisplay::default(),
            false,
        );
        assert_eq!(view.phase, PhaseView::SolutionRevealed);
        assert!(view.current_example.unwrap().solution.is_some());
    }

    #[test]
    fn control_always_sees_the_solution() {
        let view = GameView::new(
            Uuid::nil(),
            WindowRole::Control,
            &shown_state(),
            TimerDisplay::default(),
            false,
        );
        let solution = view.current_example.unwrap().solution.unwrap();
        assert_eq!(solution.patterns, vec!["Proxy".to_string()]);
    }

    #[test]
    fn empty_fields_are_omitted() {
        let view = GameView::new(
            Uuid::nil(),
            WindowRole::Viewer,
            &GameState::new(),
            TimerDisplay::default(),
            false,
        );
        let value = serde_json::to_value(&view).unwrap();

        assert!(value.get("current_example").is_none());
        assert!(value.get("selected_category").is_none());
        assert!(value["timer"].get("elapsed_seconds").is_none());
        assert_eq!(value["phase"], "setup");
        assert_eq!(value["role"], "viewer");
    }
}
