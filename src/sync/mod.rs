//! Synchronization layer keeping every window's game state consistent.
//!
//! Writers publish the whole state into a single shared [`StateSlot`] and
//! announce it on their own [`SyncBus`]. Each [`Window`] runs a sync loop that
//! re-reads the slot whenever another window's write is noticed, whenever its
//! own bus fires, and on a fixed poll, overwriting its local copy wholesale.
//! Writes are last-writer-wins.

mod bus;
#[cfg(feature = "couch-store")]
pub mod couchdb;
mod file;
mod memory;
mod poller;
mod slot;
pub mod snapshot;
mod window;

pub use bus::{Announcement, SyncBus};
pub use file::FileSlot;
pub use memory::MemorySlot;
pub use poller::{DEFAULT_POLL_INTERVAL, SyncHandle, spawn_sync_loop};
pub use slot::{SLOT_KEY, StateSlot, StorageError, StorageNotice, StorageResult, WindowId};
pub use window::{SyncError, Window, WindowRole};
