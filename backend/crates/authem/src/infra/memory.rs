//! In-memory Repository and Request Environment
//!
//! Backing implementations for tests, examples, and single-process hosts.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::entity::auth_session::AuthSession;
use crate::domain::entity::subject::SubjectRef;
use crate::domain::env::{ClientCookie, RequestEnv};
use crate::domain::repository::SessionRepository;
use crate::error::{AuthemError, AuthemResult};

/// In-memory session repository.
///
/// Cloning shares the underlying store, matching the shared-database
/// semantics of the Postgres implementation.
#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<Mutex<Vec<AuthSession>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired rows included
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot a session by token
    pub fn get_by_token(&self, token: &str) -> Option<AuthSession> {
        self.sessions
            .lock()
            .iter()
            .find(|session| session.token == token)
            .cloned()
    }

    /// Overwrite a session's expiry, moving the clock without waiting for it
    pub fn set_expires_at(&self, token: &str, expires_at: DateTime<Utc>) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.iter_mut().find(|session| session.token == token) {
            session.expires_at = expires_at;
        }
    }

    /// Overwrite a session's ttl in seconds
    pub fn set_ttl_secs(&self, token: &str, ttl_secs: i64) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.iter_mut().find(|session| session.token == token) {
            session.ttl_secs = ttl_secs;
        }
    }
}

fn client_token_matches(session: &AuthSession, client_token: &str) -> bool {
    session.client_token.as_deref().is_some_and(|stored| {
        platform::crypto::constant_time_eq(stored.as_bytes(), client_token.as_bytes())
    })
}

impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, session: &AuthSession) -> AuthemResult<()> {
        let mut sessions = self.sessions.lock();

        // Mirrors the database-level unique index on token
        if sessions.iter().any(|stored| stored.token == session.token) {
            return Err(AuthemError::TokenCollision(session.role.clone()));
        }

        sessions.push(session.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        role: &str,
        token: &str,
        client_token: Option<&str>,
    ) -> AuthemResult<Option<AuthSession>> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock();

        let found = sessions.iter_mut().find(|session| {
            session.role == role
                && session.token == token
                && session.expires_at > now
                && client_token.map_or(true, |given| client_token_matches(session, given))
        });

        Ok(found.map(|session| {
            session.renew();
            session.clone()
        }))
    }

    async fn delete_by_token(
        &self,
        role: &str,
        token: &str,
        client_token: Option<&str>,
    ) -> AuthemResult<u64> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();

        sessions.retain(|session| {
            !(session.role == role
                && session.token == token
                && client_token.map_or(true, |given| client_token_matches(session, given)))
        });

        Ok((before - sessions.len()) as u64)
    }

    async fn delete_all_for_subject(
        &self,
        subject: &SubjectRef,
        role: Option<&str>,
    ) -> AuthemResult<u64> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();

        sessions.retain(|session| {
            !(session.subject == *subject && role.map_or(true, |name| session.role == name))
        });

        Ok((before - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> AuthemResult<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();

        sessions.retain(|session| session.expires_at > now);

        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory request environment: hash-map session and cookie channels
/// plus recorded redirects. The reference host for tests and examples.
#[derive(Debug, Clone, Default)]
pub struct MemoryRequestEnv {
    session: HashMap<String, String>,
    cookies: HashMap<String, String>,
    cookie_expirations: HashMap<String, DateTime<Utc>>,
    headers: HashMap<String, String>,
    url: String,
    xhr: bool,
    redirects: Vec<String>,
}

impl MemoryRequestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn set_xhr(&mut self, xhr: bool) {
        self.xhr = xhr;
    }

    /// Simulate server-side session loss (e.g. the browser session expired)
    pub fn clear_session(&mut self) {
        self.session.clear();
    }

    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }

    pub fn cookie_expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.cookie_expirations.get(key).copied()
    }

    pub fn redirects(&self) -> &[String] {
        &self.redirects
    }

    /// Carry the persistent client state into a fresh request
    pub fn next_request(&self) -> Self {
        Self {
            redirects: Vec::new(),
            ..self.clone()
        }
    }
}

impl RequestEnv for MemoryRequestEnv {
    fn session_get(&self, key: &str) -> Option<String> {
        self.session.get(key).cloned()
    }

    fn session_set(&mut self, key: &str, value: &str) {
        self.session.insert(key.to_string(), value.to_string());
    }

    fn session_delete(&mut self, key: &str) {
        self.session.remove(key);
    }

    fn cookie_get(&self, key: &str) -> Option<String> {
        self.cookies.get(key).cloned()
    }

    fn cookie_set(&mut self, key: &str, cookie: ClientCookie) {
        self.cookies.insert(key.to_string(), cookie.value);
        self.cookie_expirations
            .insert(key.to_string(), cookie.expires_at);
    }

    fn cookie_delete(&mut self, key: &str) {
        self.cookies.remove(key);
        self.cookie_expirations.remove(key);
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    fn request_url(&self) -> String {
        self.url.clone()
    }

    fn is_xhr(&self) -> bool {
        self.xhr
    }

    fn redirect_to(&mut self, target: &str) {
        self.redirects.push(target.to_string());
    }
}
