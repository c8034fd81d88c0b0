//! Authem Error Types
//!
//! Every variant propagates to the request-handling layer uncaught; the
//! only internal retry is a single regeneration after `TokenCollision`.
//! Expired-session lookups are not errors, they resolve to "absent".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Authem-specific result type alias
pub type AuthemResult<T> = Result<T, AuthemError>;

/// Authem-specific error variants
#[derive(Debug, Error)]
pub enum AuthemError {
    /// Caller passed an absent subject to sign-in/sign-out/clear
    #[error("subject is required")]
    MissingSubject,

    /// Requested role is not registered, or a subject matches no role
    #[error("Unknown authem role: {0}")]
    UnknownRole(String),

    /// Subject type matches two or more roles and no hint was given
    #[error("Ambigous match for {}: {}", .subject, .candidates.join(", "))]
    AmbigousRole {
        subject: String,
        candidates: Vec<String>,
    },

    /// Role name registered twice within one registry scope
    #[error("authem role already registered: {0}")]
    DuplicateRole(String),

    /// `require_auth` invoked for a role without a deny-access hook
    #[error(
        "No strategy for require_{role} defined. Please configure a deny_access hook for role \"{role}\""
    )]
    DenyAccessNotConfigured { role: String },

    /// Freshly generated token collided with a stored session
    #[error("session token collision for role \"{0}\"")]
    TokenCollision(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthemError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthemError::MissingSubject => StatusCode::BAD_REQUEST,
            AuthemError::UnknownRole(_) | AuthemError::AmbigousRole { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AuthemError::DuplicateRole(_)
            | AuthemError::DenyAccessNotConfigured { .. }
            | AuthemError::TokenCollision(_)
            | AuthemError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthemError::Database(e) => {
                tracing::error!(error = %e, "Authem database error");
            }
            AuthemError::DenyAccessNotConfigured { role } => {
                tracing::error!(role = %role, "No deny-access hook configured");
            }
            AuthemError::DuplicateRole(role) => {
                tracing::error!(role = %role, "Duplicate role registration");
            }
            AuthemError::TokenCollision(role) => {
                tracing::warn!(role = %role, "Session token collision");
            }
            _ => {
                tracing::debug!(error = %self, "Authem error");
            }
        }
    }
}

impl IntoResponse for AuthemError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), self.to_string()).into_response()
    }
}
