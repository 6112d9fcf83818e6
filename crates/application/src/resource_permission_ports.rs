//! Persistence ports for roles, permissions and assignments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scopegate_core::{AppResult, OrgId};
use scopegate_domain::{Principal, PrincipalDetails, ScopeParts};

use crate::VisibilityFilter;

/// Stored role row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Role id.
    pub id: i64,
    /// Owning organization.
    pub org_id: OrgId,
    /// Role name, unique within the organization.
    pub name: String,
    /// Stable external id.
    pub uid: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Role row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Owning organization.
    pub org_id: OrgId,
    /// Role name.
    pub name: String,
    /// Stable external id.
    pub uid: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Stored permission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Permission id.
    pub id: i64,
    /// Role holding the permission.
    pub role_id: i64,
    /// Granted action.
    pub action: String,
    /// Scope the action is granted on.
    pub scope: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Permission row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    /// Role holding the permission.
    pub role_id: i64,
    /// Granted action.
    pub action: String,
    /// Scope the action is granted on.
    pub scope: String,
    /// Decomposed scope.
    pub parts: ScopeParts,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Permission row joined with its role and the principal the role is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRow {
    /// Permission id.
    pub id: i64,
    /// Name of the role holding the permission.
    pub role_name: String,
    /// Granted action.
    pub action: String,
    /// Stored scope.
    pub scope: String,
    /// Principal decoded from the assignment row.
    pub principal: PrincipalDetails,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Which users and service accounts a query may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVisibility {
    /// Filter on ids of regular users.
    pub users: VisibilityFilter,
    /// Filter on ids of service accounts.
    pub service_accounts: VisibilityFilter,
}

/// Storage-level shape of a multi-principal grant query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantQuery {
    /// Organization the roles and assignments must belong to (or global).
    pub org_id: OrgId,
    /// Stored scopes to match.
    pub scopes: Vec<String>,
    /// Actions to match.
    pub actions: Vec<String>,
    /// Restricts results to managed roles.
    pub only_managed: bool,
    /// User-bound rows filter; `None` returns every user.
    pub user_visibility: Option<UserVisibility>,
    /// Team-bound rows filter.
    pub team_visibility: VisibilityFilter,
}

/// Repository port opening sessions against the permission store.
#[async_trait]
pub trait ResourcePermissionRepository: Send + Sync {
    /// Opens an all-or-nothing read-write session.
    async fn begin_transaction(&self) -> AppResult<Box<dyn PermissionSession>>;

    /// Opens a read-only session.
    async fn begin_read(&self) -> AppResult<Box<dyn PermissionSession>>;
}

/// One storage session. Dropping a session without committing rolls it back.
#[async_trait]
pub trait PermissionSession: Send {
    /// Finds a role by name within an organization.
    async fn find_role(&mut self, org_id: OrgId, name: &str) -> AppResult<Option<RoleRecord>>;

    /// Returns whether a role uid is already taken within an organization.
    async fn role_uid_exists(&mut self, org_id: OrgId, uid: &str) -> AppResult<bool>;

    /// Inserts a role and returns the stored row.
    async fn insert_role(&mut self, role: NewRole) -> AppResult<RoleRecord>;

    /// Returns whether the role is already bound to the principal.
    async fn assignment_exists(
        &mut self,
        org_id: OrgId,
        role_id: i64,
        principal: &Principal,
    ) -> AppResult<bool>;

    /// Binds a role to a principal.
    async fn insert_assignment(
        &mut self,
        org_id: OrgId,
        role_id: i64,
        principal: &Principal,
        created_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Lists a role's permission rows on one scope.
    async fn list_permissions(
        &mut self,
        role_id: i64,
        scope: &str,
    ) -> AppResult<Vec<PermissionRecord>>;

    /// Deletes permission rows by id in one statement.
    async fn delete_permissions(&mut self, permission_ids: &[i64]) -> AppResult<()>;

    /// Inserts permission rows in one statement.
    async fn insert_permissions(&mut self, permissions: Vec<NewPermission>) -> AppResult<()>;

    /// Lists a role's permission rows on one scope, attributed to `principal`.
    ///
    /// Rows are returned even when the role has no assignment row.
    async fn list_role_grants(
        &mut self,
        role_id: i64,
        scope: &str,
        principal: &Principal,
    ) -> AppResult<Vec<GrantRow>>;

    /// Lists ids of every permission on a scope held by roles of an organization.
    async fn list_scope_permission_ids(
        &mut self,
        org_id: OrgId,
        scope: &str,
    ) -> AppResult<Vec<i64>>;

    /// Lists grants of every principal kind matching a query.
    async fn query_resource_grants(&mut self, query: &GrantQuery) -> AppResult<Vec<GrantRow>>;

    /// Commits the session.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
