use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    catalog::{CategoryFilter, ExampleId, PatternCount, PatternExample},
    state::{
        clock::Timestamp,
        phase::{GameAction, IgnoreReason, TransitionOutcome},
    },
};

/// Points granted by a single award. Not configurable.
pub const POINTS_PER_AWARD: u32 = 1;

/// HSV color used to render a team.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TeamColor {
    /// Hue in degrees.
    pub h: f32,
    /// Saturation in `0..=1`.
    pub s: f32,
    /// Value in `0..=1`.
    pub v: f32,
}

impl PartialEq for TeamColor {
    fn eq(&self, other: &Self) -> bool {
        self.h.to_bits() == other.h.to_bits()
            && self.s.to_bits() == other.s.to_bits()
            && self.v.to_bits() == other.v.to_bits()
    }
}

impl Eq for TeamColor {}

/// Team competing in the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Stable identifier of the team.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Points collected so far.
    pub score: u32,
    /// Display color.
    pub color: TeamColor,
}

impl Team {
    /// Create a team with a fresh identifier and no points.
    pub fn new(name: impl Into<String>, color: TeamColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            score: 0,
            color,
        }
    }
}

/// Record of a resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerHistoryEntry {
    /// Round the point was awarded in.
    pub round_number: u32,
    /// Example that was on screen.
    pub example: PatternExample,
    /// Team that scored, as it was right after scoring.
    pub winner: Option<Team>,
    /// When the point was awarded.
    pub timestamp: Timestamp,
    /// Seconds between the example appearing and the award.
    pub elapsed_seconds: u64,
}

/// Authoritative record of a quiz session.
///
/// Every mutation goes through one of the named transitions below; the
/// invariants (reveal flag and start time only while an example is shown,
/// used ids covering every example ever shown) hold after each of them.
/// Outside this crate they are only reachable through [`GameState::apply`]:
///
/// ```compile_fail
/// let mut state = pattern_quiz_back::state::game::GameState::new();
/// state.next_round();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    teams: Vec<Team>,
    round_number: u32,
    used_example_ids: IndexSet<ExampleId>,
    current_example: Option<PatternExample>,
    solution_revealed: bool,
    selected_category: Option<CategoryFilter>,
    selected_pattern_count: Option<PatternCount>,
    answer_history: Vec<AnswerHistoryEntry>,
    round_start_time: Option<Timestamp>,
    is_paused: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            teams: Vec::new(),
            round_number: 1,
            used_example_ids: IndexSet::new(),
            current_example: None,
            solution_revealed: false,
            selected_category: None,
            selected_pattern_count: None,
            answer_history: Vec::new(),
            round_start_time: None,
            is_paused: false,
        }
    }
}

/// Raw field values used to rebuild a state from a persisted snapshot.
#[derive(Debug, Clone, Default)]
pub(crate) struct GameStateParts {
    pub teams: Vec<Team>,
    pub round_number: u32,
    pub used_example_ids: IndexSet<ExampleId>,
    pub current_example: Option<PatternExample>,
    pub solution_revealed: bool,
    pub selected_category: Option<CategoryFilter>,
    pub selected_pattern_count: Option<PatternCount>,
    pub answer_history: Vec<AnswerHistoryEntry>,
    pub round_start_time: Option<Timestamp>,
    pub is_paused: bool,
}

impl GameState {
    /// Fresh session: no teams, round 1, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(parts: GameStateParts) -> Self {
        Self {
            teams: parts.teams,
            round_number: parts.round_number,
            used_example_ids: parts.used_example_ids,
            current_example: parts.current_example,
            solution_revealed: parts.solution_revealed,
            selected_category: parts.selected_category,
            selected_pattern_count: parts.selected_pattern_count,
            answer_history: parts.answer_history,
            round_start_time: parts.round_start_time,
            is_paused: parts.is_paused,
        }
    }

    /// Teams in insertion order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Look a team up by identifier.
    pub fn team(&self, id: Uuid) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Current round, starting at 1.
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Identifiers of every example shown during the session.
    pub fn used_example_ids(&self) -> &IndexSet<ExampleId> {
        &self.used_example_ids
    }

    /// Example currently on screen.
    pub fn current_example(&self) -> Option<&PatternExample> {
        self.current_example.as_ref()
    }

    /// Whether the solution of the current example is visible.
    pub fn solution_revealed(&self) -> bool {
        self.solution_revealed
    }

    /// Category filter chosen for the next example.
    pub fn selected_category(&self) -> Option<CategoryFilter> {
        self.selected_category
    }

    /// Pattern count chosen for the next example.
    pub fn selected_pattern_count(&self) -> Option<PatternCount> {
        self.selected_pattern_count
    }

    /// Resolved rounds, oldest first.
    pub fn answer_history(&self) -> &[AnswerHistoryEntry] {
        &self.answer_history
    }

    /// When the current example appeared.
    pub fn round_start_time(&self) -> Option<Timestamp> {
        self.round_start_time
    }

    /// Whether the round timer display is frozen.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Whole seconds since the current example appeared, if one is shown.
    pub fn elapsed_seconds(&self, now: Timestamp) -> Option<u64> {
        self.round_start_time
            .map(|start| (now.saturating_sub(start).max(0) / 1_000) as u64)
    }

    /// Apply a named transition at time `now`.
    pub fn apply(&mut self, action: GameAction, now: Timestamp) -> TransitionOutcome {
        match action {
            GameAction::SetTeams(teams) => self.set_teams(teams),
            GameAction::SetSelectedCategory(filter) => self.set_selected_category(filter),
            GameAction::SetSelectedPatternCount(count) => self.set_selected_pattern_count(count),
            GameAction::SetCurrentExample(example) => self.set_current_example(example, now),
            GameAction::RevealSolution => self.reveal_solution(),
            GameAction::AwardPoint(team_id) => self.award_point(team_id, now),
            GameAction::NextRound => self.next_round(),
            GameAction::TogglePause => self.toggle_pause(),
            GameAction::ResetGame => self.reset_game(),
        }
    }

    /// Replace the team roster wholesale.
    pub(crate) fn set_teams(&mut self, teams: Vec<Team>) -> TransitionOutcome {
        self.teams = teams;
        TransitionOutcome::Applied
    }

    /// Choose the category filter and force the pattern count to be picked again.
    pub(crate) fn set_selected_category(&mut self, filter: CategoryFilter) -> TransitionOutcome {
        self.selected_category = Some(filter);
        self.selected_pattern_count = None;
        TransitionOutcome::Applied
    }

    /// Choose the number of patterns the next example must contain.
    pub(crate) fn set_selected_pattern_count(&mut self, count: PatternCount) -> TransitionOutcome {
        self.selected_pattern_count = Some(count);
        TransitionOutcome::Applied
    }

    /// Show `example` (starting the round timer) or clear the current one.
    pub(crate) fn set_current_example(
        &mut self,
        example: Option<PatternExample>,
        now: Timestamp,
    ) -> TransitionOutcome {
        match example {
            Some(example) => {
                self.used_example_ids.insert(example.id.clone());
                self.current_example = Some(example);
                self.round_start_time = Some(now);
                self.solution_revealed = false;
                self.is_paused = false;
            }
            None => {
                self.current_example = None;
                self.round_start_time = None;
                self.solution_revealed = false;
            }
        }
        TransitionOutcome::Applied
    }

    /// Reveal the solution. Revealing twice is harmless.
    pub(crate) fn reveal_solution(&mut self) -> TransitionOutcome {
        if self.current_example.is_none() {
            return TransitionOutcome::Ignored(IgnoreReason::NoCurrentExample);
        }
        self.solution_revealed = true;
        TransitionOutcome::Applied
    }

    /// Give [`POINTS_PER_AWARD`] to `team_id` and log the round in the history.
    ///
    /// The round is not advanced; callers follow up with [`Self::next_round`].
    pub(crate) fn award_point(&mut self, team_id: Uuid, now: Timestamp) -> TransitionOutcome {
        let Some(example) = self.current_example.clone() else {
            return TransitionOutcome::Ignored(IgnoreReason::NoCurrentExample);
        };
        let Some(start) = self.round_start_time else {
            return TransitionOutcome::Ignored(IgnoreReason::RoundNotStarted);
        };
        let Some(team) = self.teams.iter_mut().find(|team| team.id == team_id) else {
            return TransitionOutcome::Ignored(IgnoreReason::UnknownTeam(team_id));
        };

        team.score = team.score.saturating_add(POINTS_PER_AWARD);
        let winner = team.clone();

        self.answer_history.push(AnswerHistoryEntry {
            round_number: self.round_number,
            example,
            winner: Some(winner),
            timestamp: now,
            elapsed_seconds: (now.saturating_sub(start).max(0) / 1_000) as u64,
        });
        TransitionOutcome::Applied
    }

    /// Advance to the next round and clear every per-round field.
    pub(crate) fn next_round(&mut self) -> TransitionOutcome {
        self.round_number += 1;
        self.current_example = None;
        self.selected_category = None;
        self.selected_pattern_count = None;
        self.solution_revealed = false;
        self.round_start_time = None;
        self.is_paused = false;
        TransitionOutcome::Applied
    }

    /// Freeze or unfreeze the round timer display.
    pub(crate) fn toggle_pause(&mut self) -> TransitionOutcome {
        if self.current_example.is_none() {
            return TransitionOutcome::Ignored(IgnoreReason::NoCurrentExample);
        }
        self.is_paused = !self.is_paused;
        TransitionOutcome::Applied
    }

    /// Return to the initial state.
    pub(crate) fn reset_game(&mut self) -> TransitionOutcome {
        *self = Self::default();
        TransitionOutcome::Applied
    }

    /// Overwrite the whole state with `next`, returning whether anything changed.
    pub(crate) fn hydrate(&mut self, next: GameState) -> bool {
        if *self == next {
            return false;
        }
        *self = next;
        true
    }
}
