//! Role Resolver
//!
//! Determines which configured role a bare subject record belongs to.
//! Used by sign-in, sign-out, and bulk-clear whenever the caller supplies
//! a subject without naming a role.

use crate::application::registry::RoleRegistry;
use crate::domain::entity::subject::Subject;
use crate::domain::role::Role;
use crate::error::{AuthemError, AuthemResult};

/// Resolve the role for `subject`, honoring an explicit hint.
///
/// The absent-subject check precedes resolution. Without a hint, a single
/// candidate by subject type wins; zero candidates fail `UnknownRole` and
/// two or more fail `AmbigousRole`, enumerating the candidate names in
/// registration order.
pub fn resolve_for<'r, S>(
    registry: &'r RoleRegistry,
    subject: Option<&S>,
    hint: Option<&str>,
) -> AuthemResult<&'r Role>
where
    S: Subject + ?Sized,
{
    let subject = subject.ok_or(AuthemError::MissingSubject)?;

    if let Some(name) = hint {
        return registry.resolve(name);
    }

    let candidates = registry.roles_for_subject_type(subject.subject_type());
    match candidates.as_slice() {
        [] => Err(AuthemError::UnknownRole(subject.subject_ref().to_string())),
        [role] => Ok(role),
        _ => Err(AuthemError::AmbigousRole {
            subject: subject.subject_ref().to_string(),
            candidates: candidates.iter().map(|role| role.name.clone()).collect(),
        }),
    }
}
