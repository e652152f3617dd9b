//! Per-window SSE streams. A stream follows the local state of exactly one
//! window, its timer, the degraded flag and the notice hub of its audience.
//! It only holds receivers, so closing the window ends the stream.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};
use tracing::info;

use crate::{
    dto::{
        game::GameView,
        sse::{Handshake, ServerEvent},
    },
    error::ServiceError,
    services::{sse_events, timer::TimerDisplay},
    state::{SharedState, WindowEntry, game::GameState},
    sync::{WindowId, WindowRole},
};

/// Which stream a client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTarget {
    /// The control window, for the moderator.
    Admin,
    /// The default viewer.
    Public,
    /// A specific viewer window.
    Viewer(WindowId),
}

impl StreamTarget {
    fn label(&self) -> &'static str {
        match self {
            StreamTarget::Admin => "admin",
            StreamTarget::Public => "public",
            StreamTarget::Viewer(_) => "viewer",
        }
    }
}

/// Receivers feeding one SSE stream.
struct Feeds {
    label: &'static str,
    window_id: WindowId,
    role: WindowRole,
    states: watch::Receiver<GameState>,
    timers: watch::Receiver<TimerDisplay>,
    degraded: watch::Receiver<bool>,
    notices: broadcast::Receiver<ServerEvent>,
}

impl Feeds {
    fn new(state: &SharedState, target: StreamTarget, entry: &WindowEntry) -> Self {
        let notices = match target {
            StreamTarget::Admin => state.admin_sse().subscribe(),
            StreamTarget::Public | StreamTarget::Viewer(_) => state.public_sse().subscribe(),
        };
        Self {
            label: target.label(),
            window_id: entry.window().id(),
            role: entry.window().role(),
            states: entry.window().subscribe(),
            timers: entry.timer().subscribe(),
            degraded: state.degraded_watcher(),
            notices,
        }
    }

    fn handshake(&self) -> Option<ServerEvent> {
        sse_events::handshake(&Handshake {
            stream: self.label.to_string(),
            window_id: self.window_id,
            role: self.role,
            message: format!("{} stream connected", self.label),
            degraded: *self.degraded.borrow(),
        })
    }

    fn game_state(&mut self) -> Option<ServerEvent> {
        let state = self.states.borrow_and_update().clone();
        let view = GameView::new(
            self.window_id,
            self.role,
            &state,
            *self.timers.borrow(),
            *self.degraded.borrow(),
        );
        sse_events::game_state(&view)
    }

    fn timer(&mut self) -> Option<ServerEvent> {
        let display = *self.timers.borrow_and_update();
        sse_events::timer(&display.into())
    }

    fn system_status(&mut self) -> Option<ServerEvent> {
        let degraded = *self.degraded.borrow_and_update();
        sse_events::system_status(degraded)
    }

    /// Wait for the next event to forward. `None` once the window is gone.
    async fn next(&mut self) -> Option<Option<ServerEvent>> {
        loop {
            tokio::select! {
                changed = self.states.changed() => {
                    changed.ok()?;
                    return Some(self.game_state());
                }
                changed = self.timers.changed() => {
                    changed.ok()?;
                    return Some(self.timer());
                }
                changed = self.degraded.changed() => {
                    changed.ok()?;
                    return Some(self.system_status());
                }
                received = self.notices.recv() => match received {
                    Ok(event) => return Some(Some(event)),
                    Err(RecvError::Closed) => return None,
                    // Skip lagged messages but keep the stream alive.
                    Err(RecvError::Lagged(_)) => continue,
                },
            }
        }
    }
}

/// Logs when the client goes away or the window closes.
struct DisconnectGuard {
    label: &'static str,
    window_id: WindowId,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        info!(stream = self.label, window = %self.window_id, "SSE stream disconnected");
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Open the SSE stream of `target`.
pub fn open_stream(
    state: &SharedState,
    target: StreamTarget,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let mut feeds = match target {
        StreamTarget::Admin => Feeds::new(state, target, state.control()),
        StreamTarget::Public => {
            let entry = state.default_viewer()?;
            Feeds::new(state, target, &*entry)
        }
        StreamTarget::Viewer(id) => {
            let entry = state.viewer(id)?;
            Feeds::new(state, target, &*entry)
        }
    };
    info!(stream = feeds.label, window = %feeds.window_id, "new SSE connection");

    let stream = async_stream::stream! {
        let _guard = DisconnectGuard {
            label: feeds.label,
            window_id: feeds.window_id,
        };

        if let Some(event) = feeds.handshake() {
            yield Ok::<Event, Infallible>(to_event(event));
        }
        if let Some(event) = feeds.game_state() {
            yield Ok::<Event, Infallible>(to_event(event));
        }

        while let Some(next) = feeds.next().await {
            if let Some(event) = next {
                yield Ok::<Event, Infallible>(to_event(event));
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
