//! Result of a successful credential lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A user identity resolved from a session token, with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// The user the token belongs to.
    pub user_id: UserId,
    /// The instant after which the token is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    /// Check whether the credential has expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the credential has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
