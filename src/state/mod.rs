//! Game state model and the application state shared across the server.

pub mod clock;
/// The game state and its transitions.
pub mod game;
/// Round phases, moderator actions and transition outcomes.
pub mod phase;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    catalog::Catalog,
    config::AppConfig,
    error::ServiceError,
    services::{round_controller::RoundController, timer::RoundTimer},
    sync::{StateSlot, SyncHandle, Window, WindowId, WindowRole, spawn_sync_loop},
};

pub use self::sse::SseHub;
use self::{clock::Clock, sse::SseState};

/// Handle to the application state shared by every route and task.
pub type SharedState = Arc<AppState>;

/// A window together with the tasks keeping it alive: its sync loop and its
/// round timer. Dropping the entry stops both.
pub struct WindowEntry {
    window: Arc<Window>,
    timer: RoundTimer,
    _sync: SyncHandle,
}

impl WindowEntry {
    fn open(window: Arc<Window>, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let timer = RoundTimer::spawn(&window, clock, config.timer_tick());
        let sync = spawn_sync_loop(window.clone(), config.poll_interval());
        Self {
            window,
            timer,
            _sync: sync,
        }
    }

    /// The replica itself.
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Elapsed round time as shown by this window.
    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }
}

/// Central application state: the catalog, the shared slot, the control
/// window driven by the round controller and every open viewer window.
pub struct AppState {
    config: AppConfig,
    catalog: Arc<Catalog>,
    slot: Arc<dyn StateSlot>,
    clock: Arc<dyn Clock>,
    controller: RoundController,
    control: WindowEntry,
    viewers: DashMap<WindowId, Arc<WindowEntry>>,
    default_viewer: WindowId,
    sse: SseState,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Open the control window and the default viewer on `slot`.
    ///
    /// The control window resumes whatever game the slot holds; an empty or
    /// unreadable slot starts a fresh game which is published right away.
    pub async fn bootstrap(
        config: AppConfig,
        catalog: Catalog,
        slot: Arc<dyn StateSlot>,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        let catalog = Arc::new(catalog);
        let control = Arc::new(Window::new(WindowRole::Control, slot.clone()));

        let resumed = match control.pull().await {
            Ok(true) => {
                let state = control.state();
                info!(
                    round = state.round_number(),
                    teams = state.teams().len(),
                    "resumed game from the state slot"
                );
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(error = %err, "could not resume game from the state slot; starting fresh");
                false
            }
        };

        let mut degraded = false;
        if !resumed {
            if let Err(err) = control.publish().await {
                warn!(error = %err, "failed to publish the initial game; entering degraded mode");
                degraded = true;
            }
        }

        let (degraded_tx, _rx) = watch::channel(degraded);
        let controller = RoundController::new(control.clone(), catalog.clone(), clock.clone());
        let control = WindowEntry::open(control, &config, clock.clone());

        let viewer = Self::open_window(&slot, &config, &clock).await;
        let default_viewer = viewer.window().id();
        let viewers = DashMap::new();
        viewers.insert(default_viewer, Arc::new(viewer));

        info!(
            control = %control.window().id(),
            viewer = %default_viewer,
            examples = catalog.len(),
            "windows opened"
        );

        Arc::new(Self {
            config,
            catalog,
            slot,
            clock,
            controller,
            control,
            viewers,
            default_viewer,
            sse: SseState::new(16, 16),
            degraded: degraded_tx,
        })
    }

    async fn open_window(
        slot: &Arc<dyn StateSlot>,
        config: &AppConfig,
        clock: &Arc<dyn Clock>,
    ) -> WindowEntry {
        let window = Arc::new(Window::new(WindowRole::Viewer, slot.clone()));
        if let Err(err) = window.pull().await {
            warn!(window = %window.id(), error = %err, "new viewer starts without the current game");
        }
        WindowEntry::open(window, config, clock.clone())
    }

    /// Open an additional viewer window.
    pub async fn open_viewer(&self) -> Arc<WindowEntry> {
        let entry = Arc::new(Self::open_window(&self.slot, &self.config, &self.clock).await);
        self.viewers.insert(entry.window().id(), entry.clone());
        info!(viewer = %entry.window().id(), "viewer window opened");
        entry
    }

    /// Close a viewer window. The default viewer always stays open.
    pub fn close_viewer(&self, id: WindowId) -> Result<(), ServiceError> {
        if id == self.default_viewer {
            return Err(ServiceError::InvalidState(
                "the default viewer cannot be closed".into(),
            ));
        }
        self.viewers
            .remove(&id)
            .map(|_| info!(viewer = %id, "viewer window closed"))
            .ok_or_else(|| ServiceError::NotFound(format!("viewer `{id}`")))
    }

    /// Look an open viewer up.
    pub fn viewer(&self, id: WindowId) -> Result<Arc<WindowEntry>, ServiceError> {
        self.viewers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("viewer `{id}`")))
    }

    /// The viewer opened at startup, backing the public surfaces.
    pub fn default_viewer(&self) -> Result<Arc<WindowEntry>, ServiceError> {
        self.viewer(self.default_viewer)
    }

    /// Identifier of the default viewer.
    pub fn default_viewer_id(&self) -> WindowId {
        self.default_viewer
    }

    /// Every open viewer, default first.
    pub fn viewers(&self) -> Vec<Arc<WindowEntry>> {
        let mut entries = self
            .viewers
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.window().id() != self.default_viewer);
        entries
    }

    /// The moderator's window.
    pub fn control(&self) -> &WindowEntry {
        &self.control
    }

    /// Single writer of the game state.
    pub fn controller(&self) -> &RoundController {
        &self.controller
    }

    /// Loaded example catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared state slot.
    pub fn slot(&self) -> &Arc<dyn StateSlot> {
        &self.slot
    }

    /// Time source used for round timing.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub used for viewer SSE streams.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the moderator SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin()
    }

    /// Whether the state slot is currently failing.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, returning whether it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }
}
