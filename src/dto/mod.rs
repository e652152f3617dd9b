use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::clock::Timestamp;

pub mod admin;
pub mod catalog;
pub mod common;
pub mod game;
pub mod health;
pub mod public;
pub mod sse;
pub mod validation;

fn format_timestamp(millis: Timestamp) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_millis_as_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1_500), "1970-01-01T00:00:01.5Z");
    }
}
