use scopegate_core::{AppResult, OrgId};
use scopegate_domain::ResourcePermission;

use crate::grant_merger::merge_grants;
use crate::{
    ACTION_ORG_USERS_READ, ACTION_SERVICE_ACCOUNTS_READ, ACTION_TEAMS_READ, GrantQuery,
    SERVICE_ACCOUNTS_ID_PREFIX, TEAMS_ID_PREFIX, USERS_ID_PREFIX, UserVisibility,
};

use super::{GetResourcePermissionsQuery, ResourcePermissionService};

impl ResourcePermissionService {
    /// Resolves the grants of every visible principal on a resource.
    ///
    /// Visibility predicates are built before storage is touched; failing to
    /// build one fails the whole query.
    pub async fn get_resource_permissions(
        &self,
        org_id: OrgId,
        query: GetResourcePermissionsQuery,
    ) -> AppResult<Vec<ResourcePermission>> {
        if query.actions.is_empty() {
            return Ok(Vec::new());
        }

        let user_visibility = if query.enforce_access_control {
            Some(UserVisibility {
                users: self.access_filter.filter(
                    &query.requester,
                    USERS_ID_PREFIX,
                    ACTION_ORG_USERS_READ,
                )?,
                service_accounts: self.access_filter.filter(
                    &query.requester,
                    SERVICE_ACCOUNTS_ID_PREFIX,
                    ACTION_SERVICE_ACCOUNTS_READ,
                )?,
            })
        } else {
            None
        };
        let team_visibility =
            self.access_filter
                .filter(&query.requester, TEAMS_ID_PREFIX, ACTION_TEAMS_READ)?;

        let mut scopes = query.resource.candidate_scopes();
        for inherited in &query.inherited_scopes {
            if !scopes.contains(inherited) {
                scopes.push(inherited.clone());
            }
        }

        let grant_query = GrantQuery {
            org_id,
            scopes,
            actions: query.actions,
            only_managed: query.only_managed,
            user_visibility,
            team_visibility,
        };

        let mut session = self.repository.begin_read().await?;
        let rows = session.query_resource_grants(&grant_query).await?;
        session.commit().await?;

        Ok(merge_grants(&query.resource.as_scope(), rows))
    }
}
