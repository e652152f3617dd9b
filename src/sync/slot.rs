use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Name of the single slot holding the serialized game state.
pub const SLOT_KEY: &str = "design-patterns-game-state";

/// Capacity of the per-slot change notice channel.
pub(crate) const NOTICE_CAPACITY: usize = 32;

/// Identifier of a window (control or viewer replica).
pub type WindowId = Uuid;

/// Result alias for slot operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by slot backends regardless of where the bytes live.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Change notification emitted by a slot after every write.
///
/// Windows ignore notices they caused themselves, like a browser storage
/// event that only fires in the other windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotice {
    /// Key that was written.
    pub key: String,
    /// Window that performed the write.
    pub origin: WindowId,
}

/// Shared key/value slot holding the latest game snapshot.
///
/// Writes are last-writer-wins; nothing orders concurrent writers.
pub trait StateSlot: Send + Sync {
    /// Key this slot reads and writes.
    fn key(&self) -> &str;
    /// Read the raw payload, `None` when nothing has been written yet.
    fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Replace the payload and notify subscribers.
    fn write(&self, origin: WindowId, payload: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Subscribe to change notices for this slot.
    fn subscribe(&self) -> broadcast::Receiver<StorageNotice>;
    /// Check that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Fan-out helper shared by the slot backends.
#[derive(Debug, Clone)]
pub(crate) struct NoticeHub {
    key: String,
    sender: broadcast::Sender<StorageNotice>,
}

impl NoticeHub {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        let (sender, _receiver) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            key: key.into(),
            sender,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
        self.sender.subscribe()
    }

    /// Notify subscribers, ignoring the case where nobody listens.
    pub(crate) fn notify(&self, origin: WindowId) {
        let _ = self.sender.send(StorageNotice {
            key: self.key.clone(),
            origin,
        });
    }
}
