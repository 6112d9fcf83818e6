use super::*;

const PRINCIPAL_KINDS: [PrincipalKind; 3] = [
    PrincipalKind::User,
    PrincipalKind::Team,
    PrincipalKind::BuiltinRole,
];

/// Principal-specific parts of one `UNION ALL` branch.
struct PrincipalBranch {
    kind: PrincipalKind,
    columns: &'static str,
    joins: &'static str,
    assignment: &'static str,
}

fn branch(kind: PrincipalKind) -> PrincipalBranch {
    match kind {
        PrincipalKind::User => PrincipalBranch {
            kind,
            columns: "assignment.user_id AS principal_id, \
                COALESCE(users.login, '') AS principal_name, \
                COALESCE(users.email, '') AS principal_email, \
                COALESCE(users.is_service_account, FALSE) AS is_service_account",
            joins: " INNER JOIN user_roles assignment ON assignment.role_id = roles.id \
                LEFT JOIN users ON users.id = assignment.user_id",
            assignment: "assignment.user_id",
        },
        PrincipalKind::Team => PrincipalBranch {
            kind,
            columns: "assignment.team_id AS principal_id, \
                COALESCE(teams.name, '') AS principal_name, \
                COALESCE(teams.email, '') AS principal_email, \
                FALSE AS is_service_account",
            joins: " INNER JOIN team_roles assignment ON assignment.role_id = roles.id \
                LEFT JOIN teams ON teams.id = assignment.team_id",
            assignment: "assignment.team_id",
        },
        PrincipalKind::BuiltinRole => PrincipalBranch {
            kind,
            columns: "0::BIGINT AS principal_id, \
                assignment.role AS principal_name, \
                '' AS principal_email, \
                FALSE AS is_service_account",
            joins: " INNER JOIN builtin_roles assignment ON assignment.role_id = roles.id",
            assignment: "assignment.role",
        },
    }
}

/// Builds one query over a resource that unions a branch per principal kind.
pub(super) fn build_resource_query(query: &GrantQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("");

    for (index, kind) in PRINCIPAL_KINDS.into_iter().enumerate() {
        if index > 0 {
            builder.push(" UNION ALL ");
        }

        let branch = branch(kind);
        push_grant_columns(&mut builder, kind);
        builder.push(branch.columns);
        builder.push(" FROM permissions INNER JOIN roles ON roles.id = permissions.role_id");
        builder.push(branch.joins);
        builder.push(" WHERE ");
        push_resource_conditions(&mut builder, &branch, query);
    }

    builder.push(" ORDER BY id");
    builder
}

/// Builds the read of one role's rows on a scope.
///
/// Principal columns come from `principal` rather than an assignment row, so
/// a role whose binding is missing still yields its rows.
pub(super) fn build_role_query(
    role_id: i64,
    scope: &str,
    principal: &Principal,
) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("");
    push_grant_columns(&mut builder, principal.kind());

    match principal {
        Principal::User(user_id) => {
            builder.push_bind(user_id.as_i64());
            builder.push(
                " AS principal_id, \
                 COALESCE(users.login, '') AS principal_name, \
                 COALESCE(users.email, '') AS principal_email, \
                 COALESCE(users.is_service_account, FALSE) AS is_service_account \
                 FROM permissions INNER JOIN roles ON roles.id = permissions.role_id \
                 LEFT JOIN users ON users.id = ",
            );
            builder.push_bind(user_id.as_i64());
        }
        Principal::Team(team_id) => {
            builder.push_bind(team_id.as_i64());
            builder.push(
                " AS principal_id, \
                 COALESCE(teams.name, '') AS principal_name, \
                 COALESCE(teams.email, '') AS principal_email, \
                 FALSE AS is_service_account \
                 FROM permissions INNER JOIN roles ON roles.id = permissions.role_id \
                 LEFT JOIN teams ON teams.id = ",
            );
            builder.push_bind(team_id.as_i64());
        }
        Principal::BuiltinRole(role) => {
            builder.push("0::BIGINT AS principal_id, ");
            builder.push_bind(role.as_str());
            builder.push(
                "::TEXT AS principal_name, \
                 '' AS principal_email, \
                 FALSE AS is_service_account \
                 FROM permissions INNER JOIN roles ON roles.id = permissions.role_id",
            );
        }
    }

    builder.push(" WHERE permissions.role_id = ");
    builder.push_bind(role_id);
    builder.push(" AND permissions.scope = ");
    builder.push_bind(scope.to_owned());
    builder.push(" ORDER BY permissions.id");
    builder
}

fn push_grant_columns(builder: &mut QueryBuilder<'static, Postgres>, kind: PrincipalKind) {
    builder.push(
        "SELECT permissions.id, roles.name AS role_name, permissions.action, permissions.scope, \
         permissions.created_at, permissions.updated_at, '",
    );
    builder.push(kind.as_str());
    builder.push("' AS principal_kind, ");
}

fn push_resource_conditions(
    builder: &mut QueryBuilder<'static, Postgres>,
    branch: &PrincipalBranch,
    query: &GrantQuery,
) {
    let org_id = query.org_id.as_i64();
    builder.push("roles.org_id IN (0, ");
    builder.push_bind(org_id);
    builder.push(") AND assignment.org_id IN (0, ");
    builder.push_bind(org_id);
    builder.push(") AND permissions.scope = ANY(");
    builder.push_bind(query.scopes.clone());
    builder.push(") AND permissions.action = ANY(");
    builder.push_bind(query.actions.clone());
    builder.push(')');

    if query.only_managed {
        builder.push(" AND roles.name LIKE 'managed:%'");
    }

    match branch.kind {
        PrincipalKind::User => {
            if let Some(visibility) = &query.user_visibility {
                builder.push(" AND ((NOT COALESCE(users.is_service_account, FALSE) AND ");
                push_visibility(builder, branch.assignment, &visibility.users);
                builder.push(") OR (COALESCE(users.is_service_account, FALSE) AND ");
                push_visibility(builder, branch.assignment, &visibility.service_accounts);
                builder.push("))");
            }
        }
        PrincipalKind::Team => {
            builder.push(" AND ");
            push_visibility(builder, branch.assignment, &query.team_visibility);
        }
        PrincipalKind::BuiltinRole => {}
    }
}
