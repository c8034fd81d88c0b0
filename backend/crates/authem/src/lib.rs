//! Authem - Multi-role Session Authentication Core
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, the repository trait, the host environment boundary
//! - `application/` - Role registry, role resolver, per-request session context
//! - `infra/` - Postgres and in-memory repository implementations
//! - `presentation/` - HTTP request environment adapter
//!
//! ## Features
//! - Any number of independently configured roles per application
//! - Server-side sessions with opaque tokens, renewed on every use
//! - Remembered client cookie with sliding expiration (opt-in per sign-in)
//! - Second-factor client token checked out-of-band via a request header
//! - Bulk invalidation ("sign out everywhere") per subject and role
//!
//! ## Security Model
//! - Tokens drawn from a 256-bit random space, unique per session
//! - Client cookies are http-only and tamper-evident (HMAC-signed)
//! - Anti-forgery token invalidated on sign-in (fixation guard)
//! - Client tokens travel on a header channel separate from the cookie,
//!   so leaking either channel alone is insufficient

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthemConfig;
pub use application::context::{Authenticator, SignInOptions};
pub use application::registry::RoleRegistry;
pub use application::resolver::resolve_for;
pub use domain::entity::auth_session::AuthSession;
pub use domain::entity::subject::{Subject, SubjectRef};
pub use domain::env::{ClientCookie, RequestEnv};
pub use domain::repository::SessionRepository;
pub use domain::role::{DenyAccessHook, Role, RoleOptions};
pub use error::{AuthemError, AuthemResult};
pub use infra::memory::{MemoryRequestEnv, MemorySessionRepository};
pub use infra::postgres::PgSessionRepository;

pub mod store {
    pub use crate::infra::postgres::PgSessionRepository as SessionStore;
}
