//! Session lifecycle states.

use std::fmt;

/// Where a connection is in its lifecycle.
///
/// Transitions only move forward:
/// `Connecting → Authenticating → Active → Closing → Closed`. A session
/// rejected during authentication goes straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// The upgrade has completed; nothing has been read yet.
    Connecting,
    /// Resolving the session cookie.
    Authenticating,
    /// Registered for broadcasts and serving commands.
    Active,
    /// Tearing down; nothing more is read.
    Closing,
    /// Done.
    Closed,
}

impl SessionState {
    /// Whether moving to `next` keeps the lifecycle order.
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
