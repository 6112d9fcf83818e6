use std::fmt::{Display, Formatter};

use scopegate_core::Requester;
use scopegate_domain::{Principal, ResourcePermission, ResourceScope};

/// Desired grant of one principal on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetResourcePermissionCommand {
    /// Resource being granted on.
    pub resource: ResourceScope,
    /// Complete set of actions the principal should hold; empty revokes all.
    pub actions: Vec<String>,
    /// Permission label the actions were derived from, e.g. `Edit`; passed to hooks.
    pub permission: String,
}

/// One entry of a batch grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetResourcePermissionsCommand {
    /// Grantee.
    pub principal: Principal,
    /// Desired grant.
    pub command: SetResourcePermissionCommand,
}

/// Multi-principal permission query on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResourcePermissionsQuery {
    /// Principal running the query; drives visibility filters.
    pub requester: Requester,
    /// Resource being displayed.
    pub resource: ResourceScope,
    /// Ancestor scopes whose managed grants surface as inherited.
    pub inherited_scopes: Vec<String>,
    /// Actions asked about; empty yields no results.
    pub actions: Vec<String>,
    /// Restricts results to managed roles.
    pub only_managed: bool,
    /// Applies user and service-account visibility filters.
    pub enforce_access_control: bool,
}

/// Result of a grant: the resolved permission and advisory warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantOutcome {
    /// Resolved grant; `None` when no actions remain.
    pub permission: Option<ResourcePermission>,
    /// Non-fatal problems hit while synthesizing action sets.
    pub warnings: Vec<GrantWarning>,
}

/// Non-fatal problem reported alongside a successful grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantWarning {
    /// No action set could be synthesized for the built-in role's tier.
    ActionSetUnavailable {
        /// Resource kind.
        resource: String,
        /// Tier derived from the built-in role.
        tier: String,
        /// Registry failure.
        reason: String,
    },
}

impl Display for GrantWarning {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActionSetUnavailable {
                resource,
                tier,
                reason,
            } => write!(
                formatter,
                "action set '{resource}:{tier}' unavailable: {reason}"
            ),
        }
    }
}
