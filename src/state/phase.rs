use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::{CategoryFilter, PatternCount, PatternExample},
    state::game::{GameState, Team},
};

/// Phases a round goes through, derived from the game state fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No example shown; filters are being chosen.
    Setup,
    /// An example is on screen, solution hidden.
    ExampleShown,
    /// An example is on screen with its solution.
    SolutionRevealed,
}

impl RoundPhase {
    /// Derive the phase of `state`.
    pub fn of(state: &GameState) -> Self {
        match (state.current_example(), state.solution_revealed()) {
            (None, _) => RoundPhase::Setup,
            (Some(_), false) => RoundPhase::ExampleShown,
            (Some(_), true) => RoundPhase::SolutionRevealed,
        }
    }
}

/// Named transitions that can be applied to a [`GameState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    /// Replace the team roster.
    SetTeams(Vec<Team>),
    /// Choose the category filter (clears the pattern count).
    SetSelectedCategory(CategoryFilter),
    /// Choose the required pattern count.
    SetSelectedPatternCount(PatternCount),
    /// Show an example, or clear the current one.
    SetCurrentExample(Option<PatternExample>),
    /// Reveal the solution of the current example.
    RevealSolution,
    /// Give one point to a team for the current round.
    AwardPoint(Uuid),
    /// Advance to the next round.
    NextRound,
    /// Flip the pause flag of the round timer.
    TogglePause,
    /// Return to the initial state.
    ResetGame,
}

impl GameAction {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::SetTeams(_) => "set_teams",
            GameAction::SetSelectedCategory(_) => "set_selected_category",
            GameAction::SetSelectedPatternCount(_) => "set_selected_pattern_count",
            GameAction::SetCurrentExample(_) => "set_current_example",
            GameAction::RevealSolution => "reveal_solution",
            GameAction::AwardPoint(_) => "award_point",
            GameAction::NextRound => "next_round",
            GameAction::TogglePause => "toggle_pause",
            GameAction::ResetGame => "reset_game",
        }
    }
}

/// Why a transition left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IgnoreReason {
    /// The transition needs an example on screen.
    #[error("no example is currently shown")]
    NoCurrentExample,
    /// The round timer was never started.
    #[error("the round has not started")]
    RoundNotStarted,
    /// The referenced team does not exist.
    #[error("team `{0}` is not part of the game")]
    UnknownTeam(Uuid),
}

/// Result of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum TransitionOutcome {
    /// The state changed (or the transition is an accepted no-op).
    Applied,
    /// The guard failed and nothing was changed.
    Ignored(IgnoreReason),
}

impl TransitionOutcome {
    /// Whether the transition went through.
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied)
    }

    /// Convert into a `Result`, exposing the ignore reason as the error.
    pub fn into_result(self) -> Result<(), IgnoreReason> {
        match self {
            TransitionOutcome::Applied => Ok(()),
            TransitionOutcome::Ignored(reason) => Err(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn example() -> PatternExample {
        PatternExample {
            id: "e1".into(),
            title: "t".into(),
            category: Category::Creational,
            code: "c".into(),
            solution_patterns: vec!["Singleton".into()],
            solution_explanation: "x".into(),
        }
    }

    #[test]
    fn phase_follows_example_and_reveal_flag() {
        let mut state = GameState::default();
        assert_eq!(RoundPhase::of(&state), RoundPhase::Setup);

        let _ = state.set_current_example(Some(example()), 0);
        assert_eq!(RoundPhase::of(&state), RoundPhase::ExampleShown);

        let _ = state.reveal_solution();
        assert_eq!(RoundPhase::of(&state), RoundPhase::SolutionRevealed);

        let _ = state.next_round();
        assert_eq!(RoundPhase::of(&state), RoundPhase::Setup);
    }

    #[test]
    fn outcome_into_result() {
        assert_eq!(TransitionOutcome::Applied.into_result(), Ok(()));
        assert_eq!(
            TransitionOutcome::Ignored(IgnoreReason::NoCurrentExample).into_result(),
            Err(IgnoreReason::NoCurrentExample)
        );
    }

    #[test]
    fn action_names_are_snake_case() {
        assert_eq!(GameAction::AwardPoint(Uuid::nil()).name(), "award_point");
        assert_eq!(GameAction::ResetGame.name(), "reset_game");
    }
}
