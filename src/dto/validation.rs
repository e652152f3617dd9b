//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest team name accepted, in characters.
pub const MAX_TEAM_NAME_CHARS: usize = 40;

/// Validates that a team name has visible characters and fits on a scoreboard row.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("team_name_blank");
        err.message = Some("Team name must not be blank".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_TEAM_NAME_CHARS {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(
            format!("Team name must be at most {MAX_TEAM_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}
