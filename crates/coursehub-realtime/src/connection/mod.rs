//! Per-connection bookkeeping shared across sessions.

pub mod active_users;
pub mod broadcast;

/// Unique connection identifier.
pub type ConnectionId = uuid::Uuid;

pub use active_users::ActiveUsers;
pub use broadcast::{BroadcastRegistry, FanOutReport};
