use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::{GameView, TimerView},
        sse::{Handshake, Notice, ServerEvent, SystemStatus},
    },
    state::SharedState,
};

pub(crate) const EVENT_HANDSHAKE: &str = "handshake";
pub(crate) const EVENT_GAME_STATE: &str = "game.state";
pub(crate) const EVENT_TIMER: &str = "timer";
pub(crate) const EVENT_SYSTEM_STATUS: &str = "system.status";
pub(crate) const EVENT_NOTICE: &str = "notice";

/// Render the handshake sent first on every stream.
pub fn handshake(payload: &Handshake) -> Option<ServerEvent> {
    render(EVENT_HANDSHAKE, payload)
}

/// Render a full game view.
pub fn game_state(view: &GameView) -> Option<ServerEvent> {
    render(EVENT_GAME_STATE, view)
}

/// Render a timer update.
pub fn timer(view: &TimerView) -> Option<ServerEvent> {
    render(EVENT_TIMER, view)
}

/// Render the degraded flag.
pub fn system_status(degraded: bool) -> Option<ServerEvent> {
    render(EVENT_SYSTEM_STATUS, &SystemStatus { degraded })
}

/// Send a notice to every audience stream.
pub fn broadcast_public_notice(state: &SharedState, message: &str) {
    send_public_event(state, EVENT_NOTICE, &notice(message));
}

/// Send a notice to the moderator stream.
pub fn broadcast_admin_notice(state: &SharedState, message: &str) {
    send_admin_event(state, EVENT_NOTICE, &notice(message));
}

fn notice(message: &str) -> Notice {
    Notice {
        message: message.to_string(),
    }
}

fn render(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    if let Some(event) = render(event, payload) {
        state.public_sse().broadcast(event);
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    if let Some(event) = render(event, payload) {
        state.admin_sse().broadcast(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_status_carries_the_flag() {
        let event = system_status(true).unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SYSTEM_STATUS));
        assert_eq!(event.data, r#"{"degraded":true}"#);
    }
}
