//! JSON snapshot of a [`GameState`] as stored in the shared slot.
//!
//! Decoding is validated: structurally broken snapshots are rejected, while
//! snapshots that merely violate a state invariant are repaired and the
//! repairs reported to the caller.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::{CategoryFilter, ExampleId, PatternCount, PatternExample},
    state::{
        clock::Timestamp,
        game::{AnswerHistoryEntry, GameState, GameStateParts, Team},
    },
};

/// Persisted shape of the game state. Field names are part of the slot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Teams in display order.
    pub teams: Vec<Team>,
    /// Current round, starting at 1.
    pub round_number: u32,
    /// Examples already shown this game, oldest first.
    pub used_example_ids: IndexSet<ExampleId>,
    /// Example on screen, if any.
    #[serde(default)]
    pub current_example: Option<PatternExample>,
    /// Whether the solution of the current example is visible.
    pub solution_revealed: bool,
    /// Category filter chosen for the next example.
    #[serde(default)]
    pub selected_category: Option<CategoryFilter>,
    /// Pattern count chosen for the next example.
    #[serde(default)]
    pub selected_pattern_count: Option<PatternCount>,
    /// Awarded points, oldest first.
    pub answer_history: Vec<AnswerHistoryEntry>,
    /// When the current example was shown.
    #[serde(default)]
    pub round_start_time: Option<Timestamp>,
    /// Whether the round timer is paused.
    pub is_paused: bool,
}

impl From<&GameState> for GameSnapshot {
    fn from(state: &GameState) -> Self {
        Self {
            teams: state.teams().to_vec(),
            round_number: state.round_number(),
            used_example_ids: state.used_example_ids().clone(),
            current_example: state.current_example().cloned(),
            solution_revealed: state.solution_revealed(),
            selected_category: state.selected_category(),
            selected_pattern_count: state.selected_pattern_count(),
            answer_history: state.answer_history().to_vec(),
            round_start_time: state.round_start_time(),
            is_paused: state.is_paused(),
        }
    }
}

/// Reasons a slot payload cannot be turned into a game state.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The state could not be serialized.
    #[error("failed to encode game snapshot")]
    Encode(#[source] serde_json::Error),
    /// The payload is not valid JSON or misses required fields.
    #[error("malformed game snapshot")]
    Malformed(#[source] serde_json::Error),
    /// Two teams share an identifier, so awards would be ambiguous.
    #[error("snapshot lists team `{0}` more than once")]
    DuplicateTeam(Uuid),
    /// An example is shown but the round start is unknown.
    #[error("snapshot shows example `{0}` without a round start time")]
    MissingRoundStart(ExampleId),
}

/// Invariant violation fixed while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// `solutionRevealed` was set without a current example.
    ClearedRevealFlag,
    /// `roundStartTime` was set without a current example.
    ClearedRoundStart,
    /// The current example id was missing from `usedExampleIds`.
    RecordedUsedExample(ExampleId),
    /// `roundNumber` was zero.
    RaisedRoundNumber,
}

/// Successfully decoded snapshot together with the repairs it needed.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// State ready to be hydrated.
    pub state: GameState,
    /// Repairs applied, empty for a clean snapshot.
    pub repairs: Vec<Repair>,
}

/// Serialize the full state for the slot.
pub fn encode(state: &GameState) -> Result<String, SnapshotError> {
    serde_json::to_string(&GameSnapshot::from(state)).map_err(SnapshotError::Encode)
}

/// Parse and validate a slot payload.
pub fn decode(payload: &str) -> Result<Decoded, SnapshotError> {
    let snapshot: GameSnapshot =
        serde_json::from_str(payload).map_err(SnapshotError::Malformed)?;
    validate(snapshot)
}

fn validate(snapshot: GameSnapshot) -> Result<Decoded, SnapshotError> {
    let mut seen = HashSet::with_capacity(snapshot.teams.len());
    if let Some(team) = snapshot.teams.iter().find(|team| !seen.insert(team.id)) {
        return Err(SnapshotError::DuplicateTeam(team.id));
    }

    let mut repairs = Vec::new();
    let mut parts = GameStateParts {
        teams: snapshot.teams,
        round_number: snapshot.round_number,
        used_example_ids: snapshot.used_example_ids,
        current_example: snapshot.current_example,
        solution_revealed: snapshot.solution_revealed,
        selected_category: snapshot.selected_category,
        selected_pattern_count: snapshot.selected_pattern_count,
        answer_history: snapshot.answer_history,
        round_start_time: snapshot.round_start_time,
        is_paused: snapshot.is_paused,
    };

    match &parts.current_example {
        Some(example) => {
            if parts.round_start_time.is_none() {
                return Err(SnapshotError::MissingRoundStart(example.id.clone()));
            }
            if parts.used_example_ids.insert(example.id.clone()) {
                repairs.push(Repair::RecordedUsedExample(example.id.clone()));
            }
        }
        None => {
            if parts.solution_revealed {
                parts.solution_revealed = false;
                repairs.push(Repair::ClearedRevealFlag);
            }
            if parts.round_start_time.take().is_some() {
                repairs.push(Repair::ClearedRoundStart);
            }
        }
    }

    if parts.round_number == 0 {
        parts.round_number = 1;
        repairs.push(Repair::RaisedRoundNumber);
    }

    Ok(Decoded {
        state: GameState::from_parts(parts),
        repairs,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        catalog::Category,
        state::game::TeamColor,
    };

    fn example(id: &str) -> PatternExample {
        PatternExample {
            id: id.into(),
            title: "Lazy holder".into(),
            category: Category::Creational,
            code: "class Holder {}".into(),
            solution_patterns: vec!["Singleton".into(), "Factory Method".into()],
            solution_explanation: "one instance".into(),
        }
    }

    fn busy_state() -> GameState {
        let team = Team::new("Red", TeamColor { h: 0.0, s: 0.9, v: 0.8 });
        let other = Team::new("Blue", TeamColor { h: 220.0, s: 0.9, v: 0.8 });
        let team_id = team.id;

        let mut state = GameState::new();
        let _ = state.set_teams(vec![team, other]);
        let _ = state.set_selected_category(CategoryFilter::Creational);
        let _ = state.set_selected_pattern_count(PatternCount::new(2).unwrap());
        let _ = state.set_current_example(Some(example("creational-05")), 1_000);
        let _ = state.reveal_solution();
        let _ = state.award_point(team_id, 16_000);
        let _ = state.next_round();
        let _ = state.set_current_example(Some(example("creational-06")), 20_000);
        let _ = state.toggle_pause();
        state
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let state = busy_state();
        let decoded = decode(&encode(&state).unwrap()).unwrap();

        assert_eq!(decoded.state, state);
        assert!(decoded.repairs.is_empty());
    }

    #[test]
    fn uses_camel_case_field_names() {
        let value: Value = serde_json::from_str(&encode(&busy_state()).unwrap()).unwrap();

        for key in [
            "teams",
            "roundNumber",
            "usedExampleIds",
            "currentExample",
            "solutionRevealed",
            "selectedCategory",
            "selectedPatternCount",
            "answerHistory",
            "roundStartTime",
            "isPaused",
        ] {
            assert!(value.get(key).is_some(), "missing `{key}`");
        }
        assert_eq!(value["answerHistory"][0]["elapsedSeconds"], 15);
    }

    #[test]
    fn rejects_garbage_and_partial_payloads() {
        assert!(matches!(decode("not json"), Err(SnapshotError::Malformed(_))));
        assert!(matches!(
            decode(r#"{"teams": [], "roundNumber": 2}"#),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            decode(&json!({
                "teams": [],
                "roundNumber": 1,
                "usedExampleIds": [],
                "solutionRevealed": false,
                "selectedPatternCount": 7,
                "answerHistory": [],
                "isPaused": false
            }).to_string()),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_duplicate_teams() {
        let team = Team::new("Twin", TeamColor::default());
        let payload = json!({
            "teams": [team, team],
            "roundNumber": 1,
            "usedExampleIds": [],
            "solutionRevealed": false,
            "answerHistory": [],
            "isPaused": false
        });

        assert!(matches!(
            decode(&payload.to_string()),
            Err(SnapshotError::DuplicateTeam(id)) if id == team.id
        ));
    }

    #[test]
    fn rejects_example_without_start_time() {
        let payload = json!({
            "teams": [],
            "roundNumber": 1,
            "usedExampleIds": ["creational-01"],
            "currentExample": example("creational-01"),
            "solutionRevealed": false,
            "answerHistory": [],
            "isPaused": false
        });

        assert!(matches!(
            decode(&payload.to_string()),
            Err(SnapshotError::MissingRoundStart(_))
        ));
    }

    #[test]
    fn repairs_invariant_violations() {
        let orphan_flags = json!({
            "teams": [],
            "roundNumber": 0,
            "usedExampleIds": [],
            "currentExample": null,
            "solutionRevealed": true,
            "answerHistory": [],
            "roundStartTime": 1234,
            "isPaused": false
        });
        let decoded = decode(&orphan_flags.to_string()).unwrap();
        assert_eq!(
            decoded.repairs,
            vec![
                Repair::ClearedRevealFlag,
                Repair::ClearedRoundStart,
                Repair::RaisedRoundNumber
            ]
        );
        assert!(!decoded.state.solution_revealed());
        assert_eq!(decoded.state.round_start_time(), None);
        assert_eq!(decoded.state.round_number(), 1);

        let unrecorded = json!({
            "teams": [],
            "roundNumber": 3,
            "usedExampleIds": [],
            "currentExample": example("creational-02"),
            "solutionRevealed": false,
            "answerHistory": [],
            "roundStartTime": 99,
            "isPaused": false
        });
        let decoded = decode(&unrecorded.to_string()).unwrap();
        assert_eq!(
            decoded.repairs,
            vec![Repair::RecordedUsedExample("creational-02".into())]
        );
        assert!(decoded.state.used_example_ids().contains("creational-02"));
    }
}
