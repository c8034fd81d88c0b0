//! Repository Traits
//!
//! Interfaces for session persistence. Implementations live in the
//! infrastructure layer.

use crate::domain::entity::auth_session::AuthSession;
use crate::domain::entity::subject::SubjectRef;
use crate::error::AuthemResult;

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Insert a freshly created session.
    ///
    /// Fails with [`TokenCollision`](crate::error::AuthemError::TokenCollision)
    /// when the token is already taken.
    async fn insert(&self, session: &AuthSession) -> AuthemResult<()>;

    /// Find the unique active session for (role, token).
    ///
    /// `client_token` is compared only when `Some`. Active means
    /// `expires_at > now` at query time. On a match the expiry is
    /// atomically extended to `now + ttl` before the session is returned;
    /// callers rely on this renewal side effect.
    async fn find_active(
        &self,
        role: &str,
        token: &str,
        client_token: Option<&str>,
    ) -> AuthemResult<Option<AuthSession>>;

    /// Delete the session(s) matching the token. Idempotent; returns the
    /// number of rows removed.
    async fn delete_by_token(
        &self,
        role: &str,
        token: &str,
        client_token: Option<&str>,
    ) -> AuthemResult<u64>;

    /// Delete every session for the subject, optionally scoped to one role
    async fn delete_all_for_subject(
        &self,
        subject: &SubjectRef,
        role: Option<&str>,
    ) -> AuthemResult<u64>;

    /// Purge rows past their expiry. Housekeeping only; active lookups
    /// already exclude expired rows.
    async fn cleanup_expired(&self) -> AuthemResult<u64>;
}
