use std::sync::Arc;

use async_trait::async_trait;
use scopegate_core::{AppResult, OrgId};
use scopegate_domain::{Principal, PrincipalKind};

use crate::PermissionSession;

/// Callback run inside the grant transaction after permissions are written.
///
/// Returning an error rolls the whole grant back.
#[async_trait]
pub trait ResourcePermissionHook: Send + Sync {
    /// Called once per successful grant for the principal kind it is registered for.
    async fn after_grant(
        &self,
        session: &mut dyn PermissionSession,
        org_id: OrgId,
        principal: &Principal,
        resource_id: &str,
        permission: &str,
    ) -> AppResult<()>;
}

/// Hooks keyed by principal kind.
#[derive(Clone, Default)]
pub struct ResourceHooks {
    /// Runs after user grants.
    pub user: Option<Arc<dyn ResourcePermissionHook>>,
    /// Runs after team grants.
    pub team: Option<Arc<dyn ResourcePermissionHook>>,
    /// Runs after built-in role grants.
    pub builtin_role: Option<Arc<dyn ResourcePermissionHook>>,
}

impl ResourceHooks {
    pub(super) fn for_kind(&self, kind: PrincipalKind) -> Option<&Arc<dyn ResourcePermissionHook>> {
        match kind {
            PrincipalKind::User => self.user.as_ref(),
            PrincipalKind::Team => self.team.as_ref(),
            PrincipalKind::BuiltinRole => self.builtin_role.as_ref(),
        }
    }
}
