//! Role Configuration
//!
//! A role is a named authentication context binding a subject type to
//! per-role options. Roles are registered once at startup and immutable
//! afterwards; several roles may share one subject type.

use chrono::Duration;
use std::fmt;
use std::sync::Arc;

use crate::domain::env::RequestEnv;

/// Hook invoked by `require_auth` when nobody is signed in.
///
/// Supplied by the integrating application, typically to redirect to its
/// sign-in page via the environment.
pub type DenyAccessHook = Arc<dyn Fn(&mut dyn RequestEnv) + Send + Sync>;

/// Per-role options
#[derive(Clone)]
pub struct RoleOptions {
    /// Default session lifetime; sessions renew to `now + ttl` on every use
    pub ttl: Duration,
    /// Require the out-of-band client token on lookups. Only effective
    /// together with the registry-wide switch, see
    /// [`AuthemConfig`](crate::application::config::AuthemConfig).
    pub verify_client_auth_token: bool,
    /// Access-denied strategy for `require_auth`
    pub deny_access: Option<DenyAccessHook>,
}

impl Default for RoleOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::weeks(2),
            verify_client_auth_token: false,
            deny_access: None,
        }
    }
}

impl fmt::Debug for RoleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleOptions")
            .field("ttl", &self.ttl)
            .field("verify_client_auth_token", &self.verify_client_auth_token)
            .field("deny_access", &self.deny_access.is_some())
            .finish()
    }
}

/// A named authentication context bound to one subject type
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub subject_type: String,
    pub options: RoleOptions,
}

impl Role {
    /// Storage key for this role's token in both channels
    pub fn storage_key(&self) -> String {
        format!("_authem_current_{}", self.name)
    }
}
