//! Groups raw grant rows by principal and folds them into resolved views.

use std::collections::BTreeMap;

use scopegate_domain::{GrantClassification, PrincipalKey, ResourcePermission};

use crate::GrantRow;

/// Groups rows by principal, then folds each principal's managed, inherited
/// and provisioned rows into separate views.
///
/// Users come first, then teams, then built-in roles. A principal yields one
/// view per non-empty classification, so at most three.
#[must_use]
pub fn merge_grants(target_scope: &str, rows: Vec<GrantRow>) -> Vec<ResourcePermission> {
    group_by_principal(rows)
        .into_values()
        .flat_map(|principal_rows| classify_and_fold(target_scope, &principal_rows))
        .collect()
}

/// Groups rows by the principal they resolve to, preserving row order.
#[must_use]
pub fn group_by_principal(rows: Vec<GrantRow>) -> BTreeMap<PrincipalKey, Vec<GrantRow>> {
    let mut grouped: BTreeMap<PrincipalKey, Vec<GrantRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.principal.key()).or_default().push(row);
    }
    grouped
}

/// Folds one principal's rows into a view per classification.
#[must_use]
pub fn classify_and_fold(target_scope: &str, rows: &[GrantRow]) -> Vec<ResourcePermission> {
    let mut managed = Vec::new();
    let mut inherited = Vec::new();
    let mut provisioned = Vec::new();

    for row in rows {
        match GrantClassification::classify(&row.role_name, &row.scope, target_scope) {
            GrantClassification::Managed => managed.push(row.clone()),
            GrantClassification::Inherited => inherited.push(row.clone()),
            GrantClassification::Provisioned => provisioned.push(row.clone()),
        }
    }

    [managed, inherited, provisioned]
        .iter()
        .filter_map(|bucket| fold_grants(target_scope, bucket))
        .collect()
}

/// Folds rows into one view; identity fields come from the first row.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn fold_grants(target_scope: &str, rows: &[GrantRow]) -> Option<ResourcePermission> {
    let first = rows.first()?;

    let mut actions: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        if !actions.contains(&row.action) {
            actions.push(row.action.clone());
        }
    }

    let classification =
        GrantClassification::classify(&first.role_name, &first.scope, target_scope);

    Some(ResourcePermission {
        id: first.id,
        role_name: first.role_name.clone(),
        actions,
        scope: first.scope.clone(),
        principal: first.principal.clone(),
        created_at: first.created_at,
        updated_at: first.updated_at,
        is_managed: classification == GrantClassification::Managed,
        is_inherited: classification == GrantClassification::Inherited,
        is_service_account: first.principal.is_service_account(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use scopegate_domain::PrincipalDetails;

    use super::{classify_and_fold, fold_grants, merge_grants};
    use crate::GrantRow;

    const TARGET: &str = "dashboards:uid:d1";

    fn user(user_id: i64) -> PrincipalDetails {
        PrincipalDetails::User {
            user_id,
            login: format!("user{user_id}"),
            email: format!("user{user_id}@example.com"),
            is_service_account: false,
        }
    }

    fn row(id: i64, role_name: &str, action: &str, scope: &str, principal: PrincipalDetails) -> GrantRow {
        let now = Utc::now();
        GrantRow {
            id,
            role_name: role_name.to_owned(),
            action: action.to_owned(),
            scope: scope.to_owned(),
            principal,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fold_grants_unions_actions_and_copies_first_row() {
        let rows = vec![
            row(4, "managed:users:1:permissions", "dashboards:read", TARGET, user(1)),
            row(5, "managed:users:1:permissions", "dashboards:write", TARGET, user(1)),
            row(6, "managed:users:1:permissions", "dashboards:read", TARGET, user(1)),
        ];

        let folded = fold_grants(TARGET, &rows);
        assert!(folded.is_some());

        let folded = folded.unwrap_or_else(|| unreachable!());
        assert_eq!(folded.id, 4);
        assert_eq!(
            folded.actions,
            vec!["dashboards:read".to_owned(), "dashboards:write".to_owned()]
        );
        assert!(folded.is_managed);
        assert!(!folded.is_inherited);
    }

    #[test]
    fn fold_grants_of_nothing_is_none() {
        assert!(fold_grants(TARGET, &[]).is_none());
    }

    #[test]
    fn one_principal_can_yield_three_views() {
        let rows = vec![
            row(1, "managed:users:1:permissions", "dashboards:read", TARGET, user(1)),
            row(2, "managed:users:1:permissions", "dashboards:write", "folders:uid:f1", user(1)),
            row(3, "fixed:dashboards:writer", "dashboards:delete", TARGET, user(1)),
        ];

        let views = classify_and_fold(TARGET, &rows);
        assert_eq!(views.len(), 3);
        assert!(views[0].is_managed);
        assert!(views[1].is_inherited);
        assert!(!views[2].is_managed && !views[2].is_inherited);
        assert_eq!(views[2].actions, vec!["dashboards:delete".to_owned()]);
    }

    #[test]
    fn merge_grants_keeps_assignment_paths_apart() {
        let team = PrincipalDetails::Team {
            team_id: 7,
            name: "ops".to_owned(),
            email: String::new(),
        };
        let rows = vec![
            row(1, "managed:teams:7:permissions", "dashboards:read", TARGET, team.clone()),
            row(2, "managed:users:1:permissions", "dashboards:write", TARGET, user(1)),
            row(3, "managed:builtins:viewer:permissions", "dashboards:read", TARGET, PrincipalDetails::BuiltinRole {
                role: "Viewer".to_owned(),
            }),
            row(4, "managed:users:1:permissions", "dashboards:delete", TARGET, user(1)),
        ];

        let merged = merge_grants(TARGET, rows);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].principal, user(1));
        assert_eq!(
            merged[0].actions,
            vec!["dashboards:write".to_owned(), "dashboards:delete".to_owned()]
        );
        assert_eq!(merged[1].principal, team);
        assert!(matches!(
            merged[2].principal,
            PrincipalDetails::BuiltinRole { .. }
        ));
    }

    #[test]
    fn service_account_flag_follows_principal() {
        let service_account = PrincipalDetails::User {
            user_id: 9,
            login: "sa-9".to_owned(),
            email: String::new(),
            is_service_account: true,
        };
        let rows = vec![row(1, "managed:users:9:permissions", "dashboards:read", TARGET, service_account)];

        let merged = merge_grants(TARGET, rows);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_service_account);
    }
}
