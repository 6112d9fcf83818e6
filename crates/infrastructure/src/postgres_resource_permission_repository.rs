use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use scopegate_application::{
    GrantQuery, GrantRow, NewPermission, NewRole, PermissionRecord, PermissionSession,
    ResourcePermissionRepository, RoleRecord, VisibilityFilter,
};
use scopegate_core::{AppError, AppResult, OrgId};
use scopegate_domain::{Principal, PrincipalDetails, PrincipalKind};

mod grants_query;
mod session;


/// PostgreSQL-backed store for managed roles, permissions and their assignments.
#[derive(Clone)]
pub struct PostgresResourcePermissionRepository {
    pool: PgPool,
}

impl PostgresResourcePermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One open database transaction.
///
/// Dropping the session without committing rolls the transaction back.
pub struct PostgresPermissionSession {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl ResourcePermissionRepository for PostgresResourcePermissionRepository {
    async fn begin_transaction(&self) -> AppResult<Box<dyn PermissionSession>> {
        let transaction = self.pool.begin().await.map_err(|error| {
            AppError::Storage(format!("failed to begin permission transaction: {error}"))
        })?;

        Ok(Box::new(PostgresPermissionSession { transaction }))
    }

    async fn begin_read(&self) -> AppResult<Box<dyn PermissionSession>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Storage(format!("failed to begin permission read: {error}"))
        })?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!("failed to mark permission read as read-only: {error}"))
            })?;

        Ok(Box::new(PostgresPermissionSession { transaction }))
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    org_id: i64,
    name: String,
    uid: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            org_id: OrgId::new(row.org_id),
            name: row.name,
            uid: row.uid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i64,
    role_id: i64,
    action: String,
    scope: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PermissionRow> for PermissionRecord {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: row.id,
            role_id: row.role_id,
            action: row.action,
            scope: row.scope,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct GrantRowRecord {
    id: i64,
    role_name: String,
    action: String,
    scope: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    principal_kind: String,
    principal_id: i64,
    principal_name: String,
    principal_email: String,
    is_service_account: bool,
}

impl TryFrom<GrantRowRecord> for GrantRow {
    type Error = AppError;

    fn try_from(row: GrantRowRecord) -> AppResult<Self> {
        let principal = match row.principal_kind.as_str() {
            "users" => PrincipalDetails::User {
                user_id: row.principal_id,
                login: row.principal_name,
                email: row.principal_email,
                is_service_account: row.is_service_account,
            },
            "teams" => PrincipalDetails::Team {
                team_id: row.principal_id,
                name: row.principal_name,
                email: row.principal_email,
            },
            "builtins" => PrincipalDetails::BuiltinRole {
                role: row.principal_name,
            },
            other => {
                return Err(AppError::Internal(format!(
                    "unknown principal kind '{other}' on permission {}",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: row.id,
            role_name: row.role_name,
            action: row.action,
            scope: row.scope,
            principal,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Assignment table and principal column for a principal kind.
fn assignment_table(kind: PrincipalKind) -> (&'static str, &'static str) {
    match kind {
        PrincipalKind::User => ("user_roles", "user_id"),
        PrincipalKind::Team => ("team_roles", "team_id"),
        PrincipalKind::BuiltinRole => ("builtin_roles", "role"),
    }
}

fn push_principal_value(builder: &mut QueryBuilder<'_, Postgres>, principal: &Principal) {
    match principal {
        Principal::User(user_id) => builder.push_bind(user_id.as_i64()),
        Principal::Team(team_id) => builder.push_bind(team_id.as_i64()),
        Principal::BuiltinRole(role) => builder.push_bind(role.as_str()),
    };
}

fn push_visibility(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    filter: &VisibilityFilter,
) {
    match filter {
        VisibilityFilter::Unrestricted => {
            builder.push("TRUE");
        }
        VisibilityFilter::Nothing => {
            builder.push("FALSE");
        }
        VisibilityFilter::Only(ids) => {
            builder.push(column);
            builder.push(" = ANY(");
            builder.push_bind(ids.clone());
            builder.push(')');
        }
    }
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Storage(format!("failed to create role '{role_name}': {error}"))
}

fn map_assignment_conflict(error: sqlx::Error, role_id: i64) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "role {role_id} is already assigned to this principal"
        ));
    }

    AppError::Storage(format!("failed to assign role {role_id}: {error}"))
}

fn insert_permissions_query(permissions: Vec<NewPermission>) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new(
        "INSERT INTO permissions (role_id, action, scope, kind, attribute, identifier, created_at, updated_at) ",
    );

    builder.push_values(permissions, |mut row, permission| {
        row.push_bind(permission.role_id)
            .push_bind(permission.action)
            .push_bind(permission.scope)
            .push_bind(permission.parts.kind)
            .push_bind(permission.parts.attribute)
            .push_bind(permission.parts.identifier)
            .push_bind(permission.created_at)
            .push_bind(permission.updated_at);
    });

    builder
}
