//! Request Environment
//!
//! The boundary with the hosting request/response layer. The session
//! context consumes this trait and never renders output itself.

use chrono::{DateTime, Utc};

/// A client-side cookie write scheduled by the session context.
///
/// Hosts must persist it domain-wide, http-only, and tamper-evident
/// (signed), so the raw token can neither be forged nor read by
/// client-side scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Host request/response surface consumed by
/// [`Authenticator`](crate::application::context::Authenticator).
///
/// The `session_*` channel is a key/value store scoped to one
/// request/response round trip and assumed tamper-evident against the
/// client (server-held or signed). The `cookie_*` channel is the
/// long-lived store persisted on the client.
pub trait RequestEnv {
    fn session_get(&self, key: &str) -> Option<String>;

    fn session_set(&mut self, key: &str, value: &str);

    fn session_delete(&mut self, key: &str);

    /// Read a verified client-side value. Hosts return `None` for cookies
    /// whose signature does not check out.
    fn cookie_get(&self, key: &str) -> Option<String>;

    fn cookie_set(&mut self, key: &str, cookie: ClientCookie);

    fn cookie_delete(&mut self, key: &str);

    /// Single inbound request header, e.g. the client token channel
    fn header(&self, name: &str) -> Option<String>;

    fn request_url(&self) -> String;

    fn is_xhr(&self) -> bool;

    /// Perform-redirect operation exposed by the host
    fn redirect_to(&mut self, target: &str);
}
