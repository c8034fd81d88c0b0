//! Subject Reference
//!
//! A subject is the principal being authenticated. This core never loads
//! or persists subject records; it tracks them as a polymorphic
//! (type, id) pair and leaves CRUD to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A record type that can be authenticated under a role.
///
/// `subject_type` is a stable type tag and must match the tag the role
/// was registered with; `subject_id` is the record's primary key.
pub trait Subject {
    fn subject_type(&self) -> &str;

    fn subject_id(&self) -> i64;

    /// Detached reference suitable for storage and comparison
    fn subject_ref(&self) -> SubjectRef {
        SubjectRef {
            subject_type: self.subject_type().to_string(),
            subject_id: self.subject_id(),
        }
    }
}

/// Polymorphic reference to an authenticated subject
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub subject_type: String,
    pub subject_id: i64,
}

impl SubjectRef {
    pub fn new(subject_type: impl Into<String>, subject_id: i64) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id,
        }
    }
}

impl fmt::Display for SubjectRef {
    /// `User#42`, the form used in role resolution error messages
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.subject_type, self.subject_id)
    }
}

impl Subject for SubjectRef {
    fn subject_type(&self) -> &str {
        &self.subject_type
    }

    fn subject_id(&self) -> i64 {
        self.subject_id
    }

    fn subject_ref(&self) -> SubjectRef {
        self.clone()
    }
}
