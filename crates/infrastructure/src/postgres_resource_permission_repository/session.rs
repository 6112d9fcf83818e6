use super::*;

#[async_trait]
impl PermissionSession for PostgresPermissionSession {
    async fn find_role(&mut self, org_id: OrgId, name: &str) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, org_id, name, uid, created_at, updated_at
            FROM roles
            WHERE org_id = $1 AND name = $2
            "#,
        )
        .bind(org_id.as_i64())
        .bind(name)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to find role '{name}' in org '{org_id}': {error}"
            ))
        })?;

        Ok(row.map(RoleRecord::from))
    }

    async fn role_uid_exists(&mut self, org_id: OrgId, uid: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM roles WHERE org_id = $1 AND uid = $2)
            "#,
        )
        .bind(org_id.as_i64())
        .bind(uid)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Storage(format!("failed to check role uid '{uid}': {error}")))
    }

    async fn insert_role(&mut self, role: NewRole) -> AppResult<RoleRecord> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (org_id, name, uid, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, org_id, name, uid, created_at, updated_at
            "#,
        )
        .bind(role.org_id.as_i64())
        .bind(role.name.as_str())
        .bind(role.uid.as_str())
        .bind(role.created_at)
        .bind(role.updated_at)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(|error| map_role_conflict(error, role.name.as_str()))?;

        Ok(row.into())
    }

    async fn assignment_exists(
        &mut self,
        org_id: OrgId,
        role_id: i64,
        principal: &Principal,
    ) -> AppResult<bool> {
        let (table, column) = assignment_table(principal.kind());
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM ");
        builder.push(table);
        builder.push(" WHERE org_id = ");
        builder.push_bind(org_id.as_i64());
        builder.push(" AND role_id = ");
        builder.push_bind(role_id);
        builder.push(" AND ");
        builder.push(column);
        builder.push(" = ");
        push_principal_value(&mut builder, principal);
        builder.push(')');

        builder
            .build_query_scalar::<bool>()
            .fetch_one(&mut *self.transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to check assignment of role {role_id} in {table}: {error}"
                ))
            })
    }

    async fn insert_assignment(
        &mut self,
        org_id: OrgId,
        role_id: i64,
        principal: &Principal,
        created_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let (table, column) = assignment_table(principal.kind());
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("INSERT INTO ");
        builder.push(table);
        builder.push(" (org_id, role_id, ");
        builder.push(column);
        builder.push(", created_at) VALUES (");
        builder.push_bind(org_id.as_i64());
        builder.push(", ");
        builder.push_bind(role_id);
        builder.push(", ");
        push_principal_value(&mut builder, principal);
        builder.push(", ");
        builder.push_bind(created_at);
        builder.push(')');

        builder
            .build()
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| map_assignment_conflict(error, role_id))?;

        Ok(())
    }

    async fn list_permissions(
        &mut self,
        role_id: i64,
        scope: &str,
    ) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, role_id, action, scope, created_at, updated_at
            FROM permissions
            WHERE role_id = $1 AND scope = $2
            ORDER BY id
            "#,
        )
        .bind(role_id)
        .bind(scope)
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list permissions of role {role_id} on '{scope}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }

    async fn delete_permissions(&mut self, permission_ids: &[i64]) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM permissions
            WHERE id = ANY($1)
            "#,
        )
        .bind(permission_ids)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Storage(format!("failed to delete permissions: {error}")))?;

        Ok(())
    }

    async fn insert_permissions(&mut self, permissions: Vec<NewPermission>) -> AppResult<()> {
        if permissions.is_empty() {
            return Ok(());
        }

        insert_permissions_query(permissions)
            .build()
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| AppError::Storage(format!("failed to insert permissions: {error}")))?;

        Ok(())
    }

    async fn list_role_grants(
        &mut self,
        role_id: i64,
        scope: &str,
        principal: &Principal,
    ) -> AppResult<Vec<GrantRow>> {
        let rows = grants_query::build_role_query(role_id, scope, principal)
            .build_query_as::<GrantRowRecord>()
            .fetch_all(&mut *self.transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to list grants of role {role_id} on '{scope}': {error}"
                ))
            })?;

        rows.into_iter().map(GrantRow::try_from).collect()
    }

    async fn list_scope_permission_ids(
        &mut self,
        org_id: OrgId,
        scope: &str,
    ) -> AppResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT permissions.id
            FROM permissions
            INNER JOIN roles ON roles.id = permissions.role_id
            WHERE roles.org_id = $1 AND permissions.scope = $2
            ORDER BY permissions.id
            "#,
        )
        .bind(org_id.as_i64())
        .bind(scope)
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list permissions on '{scope}' in org '{org_id}': {error}"
            ))
        })
    }

    async fn query_resource_grants(&mut self, query: &GrantQuery) -> AppResult<Vec<GrantRow>> {
        let rows = grants_query::build_resource_query(query)
            .build_query_as::<GrantRowRecord>()
            .fetch_all(&mut *self.transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to query resource grants in org '{}': {error}",
                    query.org_id
                ))
            })?;

        rows.into_iter().map(GrantRow::try_from).collect()
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.transaction.commit().await.map_err(|error| {
            AppError::Storage(format!("failed to commit permission transaction: {error}"))
        })
    }
}
