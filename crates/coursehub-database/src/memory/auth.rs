//! In-memory session table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use coursehub_core::error::AppError;
use coursehub_core::result::AppResult;
use coursehub_core::traits::SessionAuthenticator;
use coursehub_core::types::{AuthenticatedUser, SessionToken, UserId};

/// Session token → user table kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthenticator {
    sessions: Arc<RwLock<HashMap<SessionToken, AuthenticatedUser>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryAuthenticator {
    /// Creates an empty session table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `user_id` until `expires_at`.
    pub fn insert(
        &self,
        token: impl Into<SessionToken>,
        user_id: impl Into<UserId>,
        expires_at: DateTime<Utc>,
    ) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(
            token.into(),
            AuthenticatedUser {
                user_id: user_id.into(),
                expires_at,
            },
        );
    }

    /// Makes every subsequent lookup fail as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionAuthenticator for MemoryAuthenticator {
    async fn authenticate(&self, token: &SessionToken) -> AppResult<Option<AuthenticatedUser>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("Database error while selecting session"));
        }
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(token).cloned())
    }
}
