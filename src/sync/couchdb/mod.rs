//! Slot backend storing the snapshot in a single CouchDB document.

mod config;
mod error;
mod store;

pub use config::CouchConfig;
pub use error::{CouchResult, CouchSlotError};
pub use store::CouchSlot;
