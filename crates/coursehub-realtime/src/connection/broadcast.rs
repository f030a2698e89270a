//! Registry of live sessions' outbound queues, keyed by session token.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use coursehub_core::types::SessionToken;

use super::ConnectionId;
use crate::message::ServerMessage;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Sessions whose queue accepted the message.
    pub delivered: usize,
    /// Sessions that missed it because their queue was full or closed.
    pub dropped: usize,
}

#[derive(Debug)]
struct Entry {
    connection_id: ConnectionId,
    sender: mpsc::Sender<String>,
}

/// Maps each registered session token to its outbound queue.
///
/// Fan-out never waits on a queue: a session that cannot keep up loses the
/// message and everyone else still gets it.
#[derive(Debug)]
pub struct BroadcastRegistry {
    entries: RwLock<HashMap<SessionToken, Entry>>,
    queue_capacity: usize,
}

impl BroadcastRegistry {
    /// Creates an empty registry whose queues hold `queue_capacity` messages.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Registers a session and returns the receiving end of its queue.
    ///
    /// A token that is already registered is taken over by the new
    /// connection; the old one stops receiving broadcasts.
    pub async fn register(
        &self,
        token: SessionToken,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<String> {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let mut entries = self.entries.write().await;
        if let Some(previous) = entries.insert(
            token,
            Entry {
                connection_id,
                sender,
            },
        ) {
            warn!(
                conn_id = %connection_id,
                replaced = %previous.connection_id,
                "Session token registered twice; replacing earlier connection"
            );
        }
        debug!(conn_id = %connection_id, sessions = entries.len(), "Session registered for broadcast");
        receiver
    }

    /// Removes the session if `token` still belongs to `connection_id`.
    ///
    /// Returns whether an entry was removed.
    pub async fn unregister(&self, token: &SessionToken, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(token) {
            Some(entry) if entry.connection_id == connection_id => {
                entries.remove(token);
                debug!(conn_id = %connection_id, sessions = entries.len(), "Session unregistered");
                true
            }
            _ => false,
        }
    }

    /// Offers `message` to every registered session without blocking.
    pub async fn fan_out(&self, message: &ServerMessage) -> FanOutReport {
        let encoded = message.encode();
        let entries = self.entries.read().await;
        let mut report = FanOutReport::default();

        for entry in entries.values() {
            match entry.sender.try_send(encoded.clone()) {
                Ok(()) => report.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(conn_id = %entry.connection_id, "Send queue full, dropping broadcast");
                    report.dropped += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(conn_id = %entry.connection_id, "Send queue closed, skipping broadcast");
                    report.dropped += 1;
                }
            }
        }
        report
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` when no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_core::types::CourseId;
    use uuid::Uuid;

    fn count(course: i64, selected: u32) -> ServerMessage {
        ServerMessage::CourseCount {
            course_id: CourseId(course),
            selected,
        }
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_session() {
        let registry = BroadcastRegistry::new(4);
        let mut a = registry.register("a".into(), Uuid::new_v4()).await;
        let mut b = registry.register("b".into(), Uuid::new_v4()).await;

        let report = registry.fan_out(&count(1, 2)).await;
        assert_eq!(report, FanOutReport { delivered: 2, dropped: 0 });
        assert_eq!(a.recv().await.as_deref(), Some("N 1 2"));
        assert_eq!(b.recv().await.as_deref(), Some("N 1 2"));
    }

    #[tokio::test]
    async fn test_full_queue_only_affects_its_session() {
        let registry = BroadcastRegistry::new(1);
        let mut slow = registry.register("slow".into(), Uuid::new_v4()).await;
        let mut fast = registry.register("fast".into(), Uuid::new_v4()).await;

        registry.fan_out(&count(1, 1)).await;
        assert_eq!(fast.recv().await.as_deref(), Some("N 1 1"));

        let report = registry.fan_out(&count(1, 2)).await;
        assert_eq!(report, FanOutReport { delivered: 1, dropped: 1 });
        assert_eq!(fast.recv().await.as_deref(), Some("N 1 2"));

        assert_eq!(slow.recv().await.as_deref(), Some("N 1 1"));
        assert!(slow.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_requires_matching_connection() {
        let registry = BroadcastRegistry::new(4);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let _old = registry.register("tok".into(), first).await;
        let mut new = registry.register("tok".into(), second).await;
        assert_eq!(registry.len().await, 1);

        // The replaced connection closing must not evict its successor.
        assert!(!registry.unregister(&"tok".into(), first).await);
        registry.fan_out(&count(3, 1)).await;
        assert_eq!(new.recv().await.as_deref(), Some("N 3 1"));

        assert!(registry.unregister(&"tok".into(), second).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_closed_receiver_counts_as_dropped() {
        let registry = BroadcastRegistry::new(4);
        drop(registry.register("gone".into(), Uuid::new_v4()).await);

        let report = registry.fan_out(&count(1, 1)).await;
        assert_eq!(report, FanOutReport { delivered: 0, dropped: 1 });
    }
}
