use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::common::{HistoryEntryView, TeamSummary},
    state::game::{GameState, Team},
};

/// Row of the scoreboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreboardEntry {
    /// 1-based rank; tied teams share a rank.
    pub rank: usize,
    pub team: TeamSummary,
}

/// Teams ordered by score, highest first. Only the display is sorted; the
/// game keeps its setup order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    pub round_number: u32,
    pub entries: Vec<ScoreboardEntry>,
}

impl From<&GameState> for ScoreboardResponse {
    fn from(state: &GameState) -> Self {
        let mut teams = state.teams().iter().collect::<Vec<&Team>>();
        teams.sort_by(|a, b| b.score.cmp(&a.score));

        let mut entries = Vec::with_capacity(teams.len());
        let mut previous: Option<(u32, usize)> = None;
        for (index, team) in teams.into_iter().enumerate() {
            let rank = match previous {
                Some((score, rank)) if score == team.score => rank,
                _ => index + 1,
            };
            previous = Some((team.score, rank));
            entries.push(ScoreboardEntry {
                rank,
                team: team.into(),
            });
        }

        Self {
            round_number: state.round_number(),
            entries,
        }
    }
}

/// Resolved rounds, oldest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntryView>,
}

impl From<&GameState> for HistoryResponse {
    fn from(state: &GameState) -> Self {
        Self {
            entries: state.answer_history().iter().map(Into::into).collect(),
        }
    }
}
