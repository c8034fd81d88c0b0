//! Role Registry
//!
//! Holds the set of configured roles for a consuming application.

use crate::application::config::AuthemConfig;
use crate::domain::role::{DenyAccessHook, Role, RoleOptions};
use crate::error::{AuthemError, AuthemResult};

/// The configured roles of one application scope
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    config: AuthemConfig,
    roles: Vec<Role>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AuthemConfig) -> Self {
        Self {
            config,
            roles: Vec::new(),
        }
    }

    pub fn config(&self) -> &AuthemConfig {
        &self.config
    }

    /// Register a role. Names are unique within a registry scope.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        subject_type: impl Into<String>,
        options: RoleOptions,
    ) -> AuthemResult<()> {
        let name = name.into();
        if self.roles.iter().any(|role| role.name == name) {
            return Err(AuthemError::DuplicateRole(name));
        }

        self.roles.push(Role {
            name,
            subject_type: subject_type.into(),
            options,
        });

        Ok(())
    }

    /// Look up a role by name
    pub fn resolve(&self, name: &str) -> AuthemResult<&Role> {
        self.roles
            .iter()
            .find(|role| role.name == name)
            .ok_or_else(|| AuthemError::UnknownRole(name.to_string()))
    }

    /// Roles whose subject type matches, in registration order
    pub fn roles_for_subject_type(&self, subject_type: &str) -> Vec<&Role> {
        self.roles
            .iter()
            .filter(|role| role.subject_type == subject_type)
            .collect()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Derive a child scope.
    ///
    /// Roles registered on the child are visible to the child and its
    /// descendants only; the parent scope is never affected.
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Attach or replace the deny-access hook of a registered role
    pub fn set_deny_access(&mut self, name: &str, hook: DenyAccessHook) -> AuthemResult<()> {
        let role = self
            .roles
            .iter_mut()
            .find(|role| role.name == name)
            .ok_or_else(|| AuthemError::UnknownRole(name.to_string()))?;

        role.options.deny_access = Some(hook);
        Ok(())
    }
}
