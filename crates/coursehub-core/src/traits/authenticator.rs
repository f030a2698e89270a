//! Authentication gate consumed by the connection session.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{AuthenticatedUser, SessionToken};

/// Resolves a presented session token to a user identity.
///
/// Implementations do not judge expiry; they return the stored deadline and
/// the caller decides.
#[async_trait]
pub trait SessionAuthenticator: Send + Sync + 'static {
    /// Look up the user owning `token`.
    ///
    /// Returns `Ok(None)` when the token is unknown and an error only when
    /// the backing store could not be queried.
    async fn authenticate(&self, token: &SessionToken) -> AppResult<Option<AuthenticatedUser>>;
}
