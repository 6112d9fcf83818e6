//! Application services and ports for resource permissions.

#![forbid(unsafe_code)]

mod action_set_registry;
pub mod grant_merger;
mod resource_permission_ports;
mod resource_permission_service;
mod visibility;

pub use action_set_registry::ActionSetRegistry;
pub use resource_permission_ports::{
    GrantQuery, GrantRow, NewPermission, NewRole, PermissionRecord, PermissionSession,
    ResourcePermissionRepository, RoleRecord, UserVisibility,
};
pub use resource_permission_service::{
    GetResourcePermissionsQuery, GrantOutcome, GrantWarning, ResourceHooks,
    ResourcePermissionHook, ResourcePermissionService, SetResourcePermissionCommand,
    SetResourcePermissionsCommand,
};
pub use visibility::{
    ACTION_ORG_USERS_READ, ACTION_SERVICE_ACCOUNTS_READ, ACTION_TEAMS_READ, AccessFilter,
    SERVICE_ACCOUNTS_ID_PREFIX, ScopeAccessFilter, TEAMS_ID_PREFIX, USERS_ID_PREFIX,
    VisibilityFilter,
};
