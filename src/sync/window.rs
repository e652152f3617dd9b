use std::{fmt, sync::Arc};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    bus::SyncBus,
    slot::{StateSlot, StorageError, WindowId},
    snapshot::{self, Decoded, SnapshotError},
};
use crate::state::{game::GameState, phase::TransitionOutcome};

/// Errors raised while moving state between a window and the slot.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The slot backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The slot payload could not be encoded or decoded.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// What a window is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WindowRole {
    /// The moderator's window, the only one expected to write.
    Control,
    /// A read-only audience display.
    Viewer,
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowRole::Control => f.write_str("control"),
            WindowRole::Viewer => f.write_str("viewer"),
        }
    }
}

/// Local replica of the game state attached to the shared slot.
///
/// Display surfaces read clones or subscribe to changes; only the round
/// controller applies transitions, and only the sync loop hydrates.
///
/// Writes and pulls share one gate: a pull never interleaves with a
/// transition being applied and published, so a read that started before a
/// publish cannot land after it.
pub struct Window {
    id: WindowId,
    role: WindowRole,
    slot: Arc<dyn StateSlot>,
    bus: SyncBus,
    state: watch::Sender<GameState>,
    gate: Mutex<()>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("slot", &self.slot.key())
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Open a window with a fresh state attached to `slot`.
    pub fn new(role: WindowRole, slot: Arc<dyn StateSlot>) -> Self {
        let (state, _receiver) = watch::channel(GameState::new());
        Self {
            id: Uuid::new_v4(),
            role,
            slot,
            bus: SyncBus::default(),
            state,
            gate: Mutex::new(()),
        }
    }

    /// Identifier of the window.
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Role of the window.
    pub fn role(&self) -> WindowRole {
        self.role
    }

    /// Slot the window synchronizes with.
    pub fn slot(&self) -> &Arc<dyn StateSlot> {
        &self.slot
    }

    /// Same-process announcement channel of this window.
    pub fn bus(&self) -> &SyncBus {
        &self.bus
    }

    /// Clone of the current local state.
    pub fn state(&self) -> GameState {
        self.state.borrow().clone()
    }

    /// Watch local state changes.
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.state.subscribe()
    }

    /// Hold off pulls while the caller applies and publishes transitions.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Apply a transition to the local state, notifying watchers when it went through.
    pub(crate) fn transition<F>(&self, apply: F) -> TransitionOutcome
    where
        F: FnOnce(&mut GameState) -> TransitionOutcome,
    {
        let mut outcome = TransitionOutcome::Applied;
        self.state.send_if_modified(|state| {
            outcome = apply(state);
            outcome.is_applied()
        });
        outcome
    }

    /// Put back a previous local state, e.g. after a failed publish.
    pub(crate) fn restore(&self, previous: GameState) {
        self.state
            .send_if_modified(|state| state.hydrate(previous));
    }

    /// Write the local state into the slot and announce it on this window's bus.
    pub async fn publish(&self) -> Result<(), SyncError> {
        let payload = snapshot::encode(&self.state.borrow())?;
        self.slot.write(self.id, payload).await?;
        self.bus.announce(self.id);
        Ok(())
    }

    /// Read the slot and hydrate the local state from it.
    ///
    /// Returns whether the local state changed. An empty slot leaves the
    /// state untouched. Waits for any write in progress on this window.
    pub async fn pull(&self) -> Result<bool, SyncError> {
        let _gate = self.gate.lock().await;
        let Some(payload) = self.slot.read().await? else {
            debug!(window = %self.id, "slot is empty, nothing to hydrate");
            return Ok(false);
        };

        let Decoded { state, repairs } = snapshot::decode(&payload)?;
        if !repairs.is_empty() {
            warn!(window = %self.id, ?repairs, "repaired game snapshot before hydrating");
        }

        Ok(self.state.send_if_modified(|current| current.hydrate(state)))
    }
}
