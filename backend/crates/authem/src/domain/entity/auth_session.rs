//! Auth Session Entity
//!
//! A persisted, time-bounded proof that a subject authenticated under a
//! role, identified by an opaque token.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::subject::SubjectRef;
use crate::domain::role::Role;

/// Auth session entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Name of the owning role
    pub role: String,
    /// Polymorphic reference to the authenticated subject
    pub subject: SubjectRef,
    /// Opaque token identifying this session server-side and to the client
    pub token: String,
    /// Second-factor token; generated only for roles that verify it and
    /// transmitted on a separate header channel
    pub client_token: Option<String>,
    /// Seconds added to "now" on each renewal
    pub ttl_secs: i64,
    /// Absolute expiry; recomputed on every successful lookup
    pub expires_at: DateTime<Utc>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last renewal timestamp
    pub updated_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new session for `subject` under `role`.
    ///
    /// The TTL falls back to the role default when not given. Tokens are
    /// generated here, never supplied by callers.
    pub fn new(role: &Role, subject: SubjectRef, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let ttl = ttl.unwrap_or(role.options.ttl);

        Self {
            role: role.name.clone(),
            subject,
            token: platform::crypto::secure_token(),
            client_token: role
                .options
                .verify_client_auth_token
                .then(platform::crypto::secure_token),
            ttl_secs: ttl.num_seconds(),
            expires_at: now + ttl,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs)
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Renew-on-use: extend expiry to `now + ttl`
    pub fn renew(&mut self) {
        let now = Utc::now();
        self.expires_at = now + self.ttl();
        self.updated_at = now;
    }
}
