use std::{sync::Arc, time::Duration};

use tokio::{
    sync::broadcast::error::RecvError,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use super::window::Window;

/// Default period of the polling fallback.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Event that made a window re-read the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncTrigger {
    StorageNotice,
    Announcement,
    Poll,
}

impl SyncTrigger {
    fn as_str(self) -> &'static str {
        match self {
            SyncTrigger::StorageNotice => "storage_notice",
            SyncTrigger::Announcement => "announcement",
            SyncTrigger::Poll => "poll",
        }
    }
}

/// Owner of a running sync loop; dropping it stops the loop.
#[derive(Debug)]
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Whether the loop has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Keep `window` hydrated from its slot.
///
/// The loop pulls on slot notices written by other windows, on announcements
/// of its own bus and every `poll_interval`. Failed pulls are logged and the
/// window keeps its previous state until the next trigger.
pub fn spawn_sync_loop(window: Arc<Window>, poll_interval: Duration) -> SyncHandle {
    let mut notices = window.slot().subscribe();
    let mut announcements = window.bus().subscribe();

    let task = tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let trigger = tokio::select! {
                notice = notices.recv() => match notice {
                    Ok(notice) if notice.origin == window.id() => continue,
                    Ok(notice) if notice.key != window.slot().key() => continue,
                    Ok(_) => SyncTrigger::StorageNotice,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(window = %window.id(), skipped, "slot notices lagged");
                        SyncTrigger::StorageNotice
                    }
                    Err(RecvError::Closed) => break,
                },
                announcement = announcements.recv() => match announcement {
                    Ok(_) | Err(RecvError::Lagged(_)) => SyncTrigger::Announcement,
                    Err(RecvError::Closed) => break,
                },
                _ = ticker.tick() => SyncTrigger::Poll,
            };

            match window.pull().await {
                Ok(true) => debug!(
                    window = %window.id(),
                    role = %window.role(),
                    trigger = trigger.as_str(),
                    "window hydrated from slot"
                ),
                Ok(false) => {}
                Err(err) => warn!(
                    window = %window.id(),
                    trigger = trigger.as_str(),
                    error = %err,
                    "skipping sync, keeping previous state"
                ),
            }
        }

        debug!(window = %window.id(), "sync loop stopped");
    });

    SyncHandle { task }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        state::game::{Team, TeamColor},
        sync::{
            memory::MemorySlot,
            slot::StateSlot,
            snapshot,
            window::WindowRole,
        },
    };

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn notices_from_other_windows_hydrate_immediately() {
        let slot: Arc<dyn StateSlot> = Arc::new(MemorySlot::default());
        let control = Window::new(WindowRole::Control, slot.clone());
        let viewer = Arc::new(Window::new(WindowRole::Viewer, slot));
        let _sync = spawn_sync_loop(viewer.clone(), Duration::from_secs(3600));
        settle().await;

        let _ = control.transition(|state| {
            state.set_teams(vec![Team::new("Herons", TeamColor::default())])
        });
        control.publish().await.unwrap();
        settle().await;

        assert_eq!(viewer.state(), control.state());
    }

    #[tokio::test(start_paused = true)]
    async fn own_writes_are_picked_up_by_the_poll() {
        let slot = MemorySlot::default();
        let viewer = Arc::new(Window::new(WindowRole::Viewer, Arc::new(slot.clone())));
        let _sync = spawn_sync_loop(viewer.clone(), DEFAULT_POLL_INTERVAL);
        settle().await;

        let mut expected = viewer.state();
        let _ = expected.set_teams(vec![Team::new("Larks", TeamColor::default())]);
        slot.write(viewer.id(), snapshot::encode(&expected).unwrap())
            .await
            .unwrap();
        settle().await;
        assert_ne!(viewer.state(), expected);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(viewer.state(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn announcements_refresh_the_writer_window() {
        let slot = MemorySlot::default();
        let window = Arc::new(Window::new(WindowRole::Control, Arc::new(slot.clone())));
        let _sync = spawn_sync_loop(window.clone(), Duration::from_secs(3600));
        settle().await;

        let mut expected = window.state();
        let _ = expected.next_round();
        slot.write(window.id(), snapshot::encode(&expected).unwrap())
            .await
            .unwrap();
        window.bus().announce(window.id());
        settle().await;

        assert_eq!(window.state().round_number(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_is_skipped() {
        let slot = MemorySlot::default();
        let viewer = Arc::new(Window::new(WindowRole::Viewer, Arc::new(slot.clone())));
        let _sync = spawn_sync_loop(viewer.clone(), DEFAULT_POLL_INTERVAL);
        let before = viewer.state();

        slot.write(Uuid::new_v4(), "[]".into()).await.unwrap();
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;

        assert_eq!(viewer.state(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_loop() {
        let viewer = Arc::new(Window::new(
            WindowRole::Viewer,
            Arc::new(MemorySlot::default()),
        ));
        let sync = spawn_sync_loop(viewer.clone(), DEFAULT_POLL_INTERVAL);
        settle().await;
        assert!(!sync.is_finished());

        drop(sync);
        settle().await;
        assert_eq!(Arc::strong_count(&viewer), 1);
    }
}
