//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    catalog::CategoryFilter,
    dto::{
        common::{ExampleView, TeamColorDto},
        validation::validate_team_name,
    },
};

/// Team definition supplied by the setup flow.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamInput {
    pub name: String,
    /// Optional HSV color. If omitted, the backend chooses the first unused color from the
    /// configured colors set.
    #[serde(default)]
    pub color: Option<TeamColorDto>,
}

impl Validate for TeamInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_team_name(&self.name) {
            errors.add("name", e);
        }

        if let Some(ref color) = self.color {
            if let Err(color_errors) = color.validate() {
                errors.merge_self("color", Err(color_errors));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Replace the roster of the current game. At most twelve teams.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetTeamsRequest {
    #[validate(length(max = 12), nested)]
    pub teams: Vec<TeamInput>,
}

/// Category button press.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectCategoryRequest {
    pub category: CategoryFilter,
}

/// Pattern-count button press.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectPatternCountRequest {
    #[validate(range(min = 1, max = 3))]
    pub pattern_count: u8,
}

/// Example put on screen by the show-example intent.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShowExampleResponse {
    pub example: ExampleView,
    /// Unused examples still matching the same filters.
    pub remaining: usize,
}

/// Viewer window opened for the audience.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewerLaunchResponse {
    pub id: Uuid,
    /// Path of the viewer state, relative to the server root.
    pub url: String,
    /// SSE stream of the viewer.
    pub stream_url: String,
    /// Suggested window width in pixels.
    pub width: u32,
    /// Suggested window height in pixels.
    pub height: u32,
    /// Whether this is the viewer opened at startup.
    pub is_default: bool,
}
