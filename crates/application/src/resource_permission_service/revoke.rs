use scopegate_core::{AppResult, OrgId};
use scopegate_domain::ResourceScope;
use tracing::debug;

use super::ResourcePermissionService;

impl ResourcePermissionService {
    /// Deletes every permission any role of the organization holds on a
    /// resource, in one transaction. Returns the number of deleted rows.
    pub async fn delete_resource_permissions(
        &self,
        org_id: OrgId,
        resource: &ResourceScope,
    ) -> AppResult<usize> {
        let scope = resource.as_scope();
        let mut session = self.repository.begin_transaction().await?;

        let permission_ids = session.list_scope_permission_ids(org_id, &scope).await?;
        if !permission_ids.is_empty() {
            session.delete_permissions(&permission_ids).await?;
        }

        session.commit().await?;
        debug!(scope = %scope, org_id = %org_id, deleted = permission_ids.len(), "deleted resource permissions");

        Ok(permission_ids.len())
    }
}
