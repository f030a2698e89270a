//! Tracks which users hold a live connection.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use coursehub_core::types::UserId;

use super::ConnectionId;

/// One connection per user, enforced when single-session mode is on.
#[derive(Debug, Default)]
pub struct ActiveUsers {
    users: DashMap<UserId, ConnectionId>,
}

impl ActiveUsers {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `user_id` for `connection_id`. Fails if another connection
    /// already holds it.
    pub fn try_claim(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        match self.users.entry(user_id.clone()) {
            Entry::Occupied(held) => *held.get() == connection_id,
            Entry::Vacant(slot) => {
                slot.insert(connection_id);
                true
            }
        }
    }

    /// Releases the claim if `connection_id` holds it.
    pub fn release(&self, user_id: &UserId, connection_id: ConnectionId) {
        self.users
            .remove_if(user_id, |_, holder| *holder == connection_id);
    }

    /// Number of users currently holding a connection.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` when nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
