use tokio::sync::broadcast;

use super::slot::WindowId;

/// Capacity of a window's announcement channel.
pub(crate) const ANNOUNCEMENT_CAPACITY: usize = 16;

/// Same-process announcement that a window just rewrote the slot.
///
/// Carries no state; listeners re-read the slot themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    /// Window that wrote the slot.
    pub writer: WindowId,
}

/// Announcement channel scoped to a single window.
///
/// The writer announces on its own bus so its local listeners refresh through
/// the same pull path as every other window.
#[derive(Debug, Clone)]
pub struct SyncBus {
    sender: broadcast::Sender<Announcement>,
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new(ANNOUNCEMENT_CAPACITY)
    }
}

impl SyncBus {
    /// Create a bus buffering up to `capacity` announcements per listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a listener for subsequent announcements.
    pub fn subscribe(&self) -> broadcast::Receiver<Announcement> {
        self.sender.subscribe()
    }

    /// Announce a write, ignoring the case where nobody listens.
    pub fn announce(&self, writer: WindowId) {
        let _ = self.sender.send(Announcement { writer });
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn listeners_receive_announcements_after_subscribing() {
        let bus = SyncBus::default();
        bus.announce(Uuid::nil());

        let mut listener = bus.subscribe();
        let writer = Uuid::new_v4();
        bus.announce(writer);

        assert_eq!(listener.recv().await.unwrap(), Announcement { writer });
        assert!(listener.try_recv().is_err());
    }
}
