//! User session lookup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use coursehub_core::error::{AppError, ErrorKind};
use coursehub_core::result::AppResult;
use coursehub_core::traits::SessionAuthenticator;
use coursehub_core::types::{AuthenticatedUser, SessionToken, UserId};

/// Repository resolving session cookies against the user table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the user holding `session`, with its expiry as a Unix timestamp.
    pub async fn find_by_session(&self, session: &SessionToken) -> AppResult<Option<(UserId, i64)>> {
        sqlx::query_as::<_, (UserId, i64)>("SELECT id, expr FROM users WHERE session = $1")
            .bind(session)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Database error while selecting session",
                    e,
                )
            })
    }
}

#[async_trait]
impl SessionAuthenticator for UserRepository {
    async fn authenticate(&self, token: &SessionToken) -> AppResult<Option<AuthenticatedUser>> {
        Ok(self
            .find_by_session(token)
            .await?
            .map(|(user_id, expr)| AuthenticatedUser {
                user_id,
                // An out-of-range deadline is treated as already expired.
                expires_at: DateTime::from_timestamp(expr, 0).unwrap_or(DateTime::<Utc>::MIN_UTC),
            }))
    }
}
