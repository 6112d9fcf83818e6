//! Domain entities and invariants for resource permissions.

#![forbid(unsafe_code)]

mod action_set;
mod principal;
mod resource_permission;
mod scope;

pub use action_set::{ActionSet, PermissionTier};
pub use principal::{BuiltinRole, ManagedRoleName, Principal, PrincipalKind, TeamId, UserId};
pub use resource_permission::{PrincipalDetails, PrincipalKey, ResourcePermission};
pub use scope::{
    GrantClassification, MANAGED_ROLE_PREFIX, ResourceScope, ScopeParts, WILDCARD_SCOPE,
    is_managed_role_name, scope, split_scope,
};
