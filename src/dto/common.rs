use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    catalog::{Category, PatternExample},
    dto::format_timestamp,
    state::game::{AnswerHistoryEntry, Team, TeamColor},
};

/// HSV color exchanged with clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, Validate)]
pub struct TeamColorDto {
    /// Hue in degrees.
    #[validate(range(min = -360.0, max = 360.0))]
    pub h: f32,
    /// Saturation between 0 and 1.
    #[validate(range(min = 0.0, max = 1.0))]
    pub s: f32,
    /// Value between 0 and 1.
    #[validate(range(min = 0.0, max = 1.0))]
    pub v: f32,
}

impl From<TeamColor> for TeamColorDto {
    fn from(color: TeamColor) -> Self {
        Self {
            h: color.h,
            s: color.s,
            v: color.v,
        }
    }
}

impl From<TeamColorDto> for TeamColor {
    fn from(color: TeamColorDto) -> Self {
        Self {
            h: color.h,
            s: color.s,
            v: color.v,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a team exposed to REST/SSE clients.
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub color: TeamColorDto,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            score: team.score,
            color: team.color.into(),
        }
    }
}

/// Solution of an example, only sent once it may be shown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SolutionView {
    pub patterns: Vec<String>,
    pub explanation: String,
}

/// Example as displayed on a surface.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExampleView {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub code: String,
    /// Number of patterns the teams have to find.
    pub pattern_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionView>,
}

impl ExampleView {
    /// Project `example`, including its solution only when `with_solution` is set.
    pub fn new(example: &PatternExample, with_solution: bool) -> Self {
        Self {
            id: example.id.clone(),
            title: example.title.clone(),
            category: example.category,
            code: example.code.clone(),
            pattern_count: example.pattern_count(),
            solution: with_solution.then(|| SolutionView {
                patterns: example.solution_patterns.clone(),
                explanation: example.solution_explanation.clone(),
            }),
        }
    }
}

/// Resolved round as listed in the answer history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntryView {
    pub round_number: u32,
    pub example: ExampleView,
    pub winner: Option<TeamSummary>,
    /// RFC 3339 time of the award.
    pub awarded_at: String,
    pub elapsed_seconds: u64,
}

impl From<&AnswerHistoryEntry> for HistoryEntryView {
    fn from(entry: &AnswerHistoryEntry) -> Self {
        Self {
            round_number: entry.round_number,
            example: ExampleView::new(&entry.example, true),
            winner: entry.winner.as_ref().map(TeamSummary::from),
            awarded_at: format_timestamp(entry.timestamp),
            elapsed_seconds: entry.elapsed_seconds,
        }
    }
}
