use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{RwLock, broadcast};

use super::slot::{
    NoticeHub, SLOT_KEY, StateSlot, StorageError, StorageNotice, StorageResult, WindowId,
};

/// Slot kept in process memory; cheap to clone, every clone shares the value.
#[derive(Debug, Clone)]
pub struct MemorySlot {
    value: Arc<RwLock<Option<String>>>,
    notices: NoticeHub,
}

impl Default for MemorySlot {
    fn default() -> Self {
        Self::new(SLOT_KEY)
    }
}

impl MemorySlot {
    /// Create an empty slot for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            value: Arc::new(RwLock::new(None)),
            notices: NoticeHub::new(key),
        }
    }

    /// Drop the stored payload without notifying anybody.
    pub async fn clear(&self) {
        self.value.write().await.take();
    }
}

impl StateSlot for MemorySlot {
    fn key(&self) -> &str {
        self.notices.key()
    }

    fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.value.clone();
        Box::pin(async move { Ok(value.read().await.clone()) })
    }

    fn write(&self, origin: WindowId, payload: String) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.clone();
        Box::pin(async move {
            *slot.value.write().await = Some(payload);
            slot.notices.notify(origin);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
        self.notices.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok::<(), StorageError>(()) })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn clones_share_the_payload_and_notices() {
        let slot = MemorySlot::default();
        let other = slot.clone();
        let mut notices = other.subscribe();
        let writer = Uuid::new_v4();

        assert_eq!(other.read().await.unwrap(), None);
        slot.write(writer, "{}".into()).await.unwrap();

        assert_eq!(other.read().await.unwrap().as_deref(), Some("{}"));
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.origin, writer);
        assert_eq!(notice.key, SLOT_KEY);
    }

    #[tokio::test]
    async fn clear_empties_the_slot() {
        let slot = MemorySlot::new("custom");
        slot.write(Uuid::nil(), "x".into()).await.unwrap();
        slot.clear().await;
        assert_eq!(slot.read().await.unwrap(), None);
        assert_eq!(slot.key(), "custom");
    }
}
