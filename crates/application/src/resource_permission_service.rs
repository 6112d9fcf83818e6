use std::sync::Arc;

use scopegate_core::{AppError, AppResult};
use scopegate_domain::Principal;

use crate::{AccessFilter, ActionSetRegistry, ResourcePermissionRepository};

mod commands;
mod grants;
mod hooks;
mod query;
mod revoke;


pub use commands::{
    GetResourcePermissionsQuery, GrantOutcome, GrantWarning, SetResourcePermissionCommand,
    SetResourcePermissionsCommand,
};
pub use hooks::{ResourceHooks, ResourcePermissionHook};

/// Application service granting, revoking and resolving resource permissions.
#[derive(Clone)]
pub struct ResourcePermissionService {
    repository: Arc<dyn ResourcePermissionRepository>,
    action_sets: Arc<ActionSetRegistry>,
    access_filter: Arc<dyn AccessFilter>,
    hooks: ResourceHooks,
}

impl ResourcePermissionService {
    /// Creates a new service from its collaborators.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ResourcePermissionRepository>,
        action_sets: Arc<ActionSetRegistry>,
        access_filter: Arc<dyn AccessFilter>,
    ) -> Self {
        Self {
            repository,
            action_sets,
            access_filter,
            hooks: ResourceHooks::default(),
        }
    }

    /// Replaces the hooks run inside grant transactions.
    #[must_use]
    pub fn with_hooks(mut self, hooks: ResourceHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the action-set registry shared with this service.
    #[must_use]
    pub fn action_sets(&self) -> &ActionSetRegistry {
        self.action_sets.as_ref()
    }
}

fn ensure_principal_exists(principal: &Principal) -> AppResult<()> {
    match principal {
        Principal::User(user_id) if user_id.as_i64() <= 0 => Err(AppError::NotFound(format!(
            "user '{user_id}' was not found"
        ))),
        Principal::Team(team_id) if team_id.as_i64() <= 0 => Err(AppError::NotFound(format!(
            "team '{team_id}' was not found"
        ))),
        Principal::User(_) | Principal::Team(_) | Principal::BuiltinRole(_) => Ok(()),
    }
}
