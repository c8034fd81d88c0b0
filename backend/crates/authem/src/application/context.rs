//! Session Context
//!
//! The per-request façade orchestrating the role registry, the session
//! store, and the two storage channels. One instance per inbound request;
//! per-role resolution happens at most once per request and re-entrant
//! calls return the memoized result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use crate::application::registry::RoleRegistry;
use crate::application::resolver;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::entity::subject::{Subject, SubjectRef};
use crate::domain::env::{ClientCookie, RequestEnv};
use crate::domain::repository::SessionRepository;
use crate::domain::role::Role;
use crate::error::{AuthemError, AuthemResult};

/// Server-side key of the anti-forgery token invalidated on sign-in
pub const CSRF_TOKEN_KEY: &str = "_csrf_token";

/// Server-side key recording where to return after authentication
pub const RETURN_TO_URL_KEY: &str = "return_to_url";

/// Request header carrying the second-factor client token
pub const CLIENT_AUTH_TOKEN_HEADER: &str = "client-auth-token";

/// Options for sign-in
#[derive(Debug, Clone, Default)]
pub struct SignInOptions {
    /// Session lifetime override; defaults to the role's ttl
    pub ttl: Option<Duration>,
    /// Persist the token into client-side storage (remembered session)
    pub remember: bool,
    /// Explicit role hint for the bare-subject entry points
    pub as_role: Option<String>,
}

/// Per-request authentication context
pub struct Authenticator<R, E> {
    registry: Arc<RoleRegistry>,
    repo: Arc<R>,
    env: E,
    memo: HashMap<String, Option<SubjectRef>>,
}

impl<R, E> Authenticator<R, E>
where
    R: SessionRepository,
    E: RequestEnv,
{
    pub fn new(registry: Arc<RoleRegistry>, repo: Arc<R>, env: E) -> Self {
        Self {
            registry,
            repo,
            env,
            memo: HashMap::new(),
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Release the environment so the host can emit the response
    pub fn into_env(self) -> E {
        self.env
    }

    // ========================================================================
    // Current subject
    // ========================================================================

    /// Resolve the current subject for `role`, memoized per request.
    ///
    /// Resolution reads the server-side channel first, then falls back to
    /// the client-side channel. Expired or unmatched tokens resolve to
    /// `None` silently.
    pub async fn current(&mut self, role: &str) -> AuthemResult<Option<SubjectRef>> {
        let role = self.registry.resolve(role)?.clone();

        if let Some(resolved) = self.memo.get(&role.name) {
            return Ok(resolved.clone());
        }

        let resolved = self.fetch_subject_by_token(&role).await?;
        self.memo.insert(role.name.clone(), resolved.clone());

        Ok(resolved)
    }

    pub async fn signed_in(&mut self, role: &str) -> AuthemResult<bool> {
        Ok(self.current(role).await?.is_some())
    }

    // ========================================================================
    // Sign in
    // ========================================================================

    /// Sign `subject` in under an explicit role.
    ///
    /// The subject is observable via `current` for the remainder of this
    /// request before any storage round trip completes.
    pub async fn sign_in_as<S>(
        &mut self,
        role: &str,
        subject: Option<&S>,
        options: SignInOptions,
    ) -> AuthemResult<AuthSession>
    where
        S: Subject + ?Sized,
    {
        let role = self.registry.resolve(role)?.clone();
        let subject = subject.ok_or(AuthemError::MissingSubject)?.subject_ref();

        // Invalidate any anti-forgery token left from the anonymous session
        self.env.session_delete(CSRF_TOKEN_KEY);

        self.memo.insert(role.name.clone(), Some(subject.clone()));

        let session = self.create_session(&role, subject, options.ttl).await?;

        self.env.session_set(&role.storage_key(), &session.token);
        if options.remember {
            self.save_cookie(&role, &session);
        }

        tracing::info!(
            role = %role.name,
            subject = %session.subject,
            remember = options.remember,
            "Signed in"
        );

        Ok(session)
    }

    /// Sign in, resolving the role from the subject itself.
    ///
    /// `options.as_role` serves as the explicit hint when the subject type
    /// is shared by several roles.
    pub async fn sign_in<S>(
        &mut self,
        subject: Option<&S>,
        options: SignInOptions,
    ) -> AuthemResult<AuthSession>
    where
        S: Subject + ?Sized,
    {
        let role = resolver::resolve_for(&self.registry, subject, options.as_role.as_deref())?
            .name
            .clone();

        self.sign_in_as(&role, subject, options).await
    }

    // ========================================================================
    // Sign out
    // ========================================================================

    /// Sign out the current session for `role`
    pub async fn sign_out_role(&mut self, role: &str) -> AuthemResult<()> {
        let role = self.registry.resolve(role)?.clone();
        let key = role.storage_key();

        self.memo.insert(role.name.clone(), None);

        if let Some(token) = self.current_auth_token(&key) {
            let client_token = self.current_client_auth_token(&role);
            self.repo
                .delete_by_token(&role.name, &token, client_token.as_deref())
                .await?;
        }

        self.env.cookie_delete(&key);
        self.env.session_delete(&key);

        tracing::info!(role = %role.name, "Signed out");
        Ok(())
    }

    /// Sign out, resolving the role from the subject itself
    pub async fn sign_out<S>(&mut self, subject: Option<&S>) -> AuthemResult<()>
    where
        S: Subject + ?Sized,
    {
        let role = resolver::resolve_for(&self.registry, subject, None)?
            .name
            .clone();

        self.sign_out_role(&role).await
    }

    // ========================================================================
    // Bulk invalidation
    // ========================================================================

    /// Sign out the current request and every other session the subject
    /// holds under `role` (all devices).
    pub async fn clear_for<S>(&mut self, role: &str, subject: Option<&S>) -> AuthemResult<u64>
    where
        S: Subject + ?Sized,
    {
        let subject = subject.ok_or(AuthemError::MissingSubject)?.subject_ref();

        self.sign_out_role(role).await?;
        let deleted = self.repo.delete_all_for_subject(&subject, Some(role)).await?;

        tracing::info!(role, subject = %subject, deleted, "Cleared all sessions");
        Ok(deleted)
    }

    /// `clear_for` with the role resolved from the subject itself
    pub async fn clear_all_sessions_for<S>(&mut self, subject: Option<&S>) -> AuthemResult<u64>
    where
        S: Subject + ?Sized,
    {
        let role = resolver::resolve_for(&self.registry, subject, None)?
            .name
            .clone();

        self.clear_for(&role, subject).await
    }

    // ========================================================================
    // Access enforcement
    // ========================================================================

    /// Enforce authentication for `role`.
    ///
    /// When nobody is signed in, the request URL is recorded as the return
    /// target (interactive requests only) and the role's deny-access hook
    /// runs. A missing hook is a configuration error and surfaces as
    /// [`AuthemError::DenyAccessNotConfigured`] naming the role.
    pub async fn require_auth(&mut self, role: &str) -> AuthemResult<()> {
        if self.signed_in(role).await? {
            return Ok(());
        }

        if !self.env.is_xhr() {
            let url = self.env.request_url();
            self.env.session_set(RETURN_TO_URL_KEY, &url);
        }

        let role = self.registry.resolve(role)?.clone();
        match &role.options.deny_access {
            Some(hook) => {
                hook(&mut self.env);
                Ok(())
            }
            None => Err(AuthemError::DenyAccessNotConfigured { role: role.name }),
        }
    }

    /// Redirect to the recorded return target, falling back to `fallback`.
    /// The target is consumed (cleared after read).
    pub fn redirect_back_or_to(&mut self, fallback: &str) {
        let target = self
            .env
            .session_get(RETURN_TO_URL_KEY)
            .unwrap_or_else(|| fallback.to_string());

        self.env.session_delete(RETURN_TO_URL_KEY);
        self.env.redirect_to(&target);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn fetch_subject_by_token(&mut self, role: &Role) -> AuthemResult<Option<SubjectRef>> {
        let key = role.storage_key();

        let Some(token) = self.current_auth_token(&key) else {
            return Ok(None);
        };

        let client_token = self.current_client_auth_token(role);
        if self.verify_client_auth_token(role) && client_token.is_none() {
            return Ok(None);
        }

        let session = self
            .repo
            .find_active(&role.name, &token, client_token.as_deref())
            .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        // Sliding client cookie: refresh expiry on every cookie-assisted use
        if self.env.cookie_get(&key).is_some() {
            self.save_cookie(role, &session);
        }
        // Repopulate the server-side channel even when the token arrived
        // via the client channel
        self.env.session_set(&key, &session.token);

        Ok(Some(session.subject))
    }

    async fn create_session(
        &self,
        role: &Role,
        subject: SubjectRef,
        ttl: Option<Duration>,
    ) -> AuthemResult<AuthSession> {
        let session = AuthSession::new(role, subject.clone(), ttl);

        match self.repo.insert(&session).await {
            Ok(()) => Ok(session),
            Err(AuthemError::TokenCollision(_)) => {
                // A 256-bit draw collided with a stored token; retry once
                // with fresh material before surfacing.
                let retry = AuthSession::new(role, subject, ttl);
                self.repo.insert(&retry).await?;
                Ok(retry)
            }
            Err(e) => Err(e),
        }
    }

    fn current_auth_token(&self, key: &str) -> Option<String> {
        self.env
            .session_get(key)
            .or_else(|| self.env.cookie_get(key))
    }

    fn current_client_auth_token(&self, role: &Role) -> Option<String> {
        if self.verify_client_auth_token(role) {
            self.env.header(CLIENT_AUTH_TOKEN_HEADER)
        } else {
            None
        }
    }

    fn verify_client_auth_token(&self, role: &Role) -> bool {
        self.registry.config().verify_client_auth_token && role.options.verify_client_auth_token
    }

    fn save_cookie(&mut self, role: &Role, session: &AuthSession) {
        self.env.cookie_set(
            &role.storage_key(),
            ClientCookie {
                value: session.token.clone(),
                expires_at: session.expires_at,
            },
        );
    }
}
