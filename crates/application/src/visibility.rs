//! Visibility predicates restricting which users and teams a requester may see.

use std::collections::BTreeSet;

use scopegate_core::{AppError, AppResult, Requester};
use scopegate_domain::WILDCARD_SCOPE;

/// Action required to see organization users.
pub const ACTION_ORG_USERS_READ: &str = "org.users:read";
/// Action required to see service accounts.
pub const ACTION_SERVICE_ACCOUNTS_READ: &str = "serviceaccounts:read";
/// Action required to see teams.
pub const ACTION_TEAMS_READ: &str = "teams:read";

/// Scope prefix addressing users by id.
pub const USERS_ID_PREFIX: &str = "users:id:";
/// Scope prefix addressing service accounts by id.
pub const SERVICE_ACCOUNTS_ID_PREFIX: &str = "serviceaccounts:id:";
/// Scope prefix addressing teams by id.
pub const TEAMS_ID_PREFIX: &str = "teams:id:";

/// Restriction on principal ids a query may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityFilter {
    /// Every id is visible.
    Unrestricted,
    /// Only the listed ids are visible.
    Only(Vec<i64>),
    /// No id is visible.
    Nothing,
}

impl VisibilityFilter {
    /// Returns whether the filter lets an id through.
    #[must_use]
    pub fn allows(&self, id: i64) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Only(ids) => ids.contains(&id),
            Self::Nothing => false,
        }
    }
}

/// Port building visibility predicates for a requester.
pub trait AccessFilter: Send + Sync {
    /// Builds the filter for ids under `scope_prefix` visible through `action`.
    ///
    /// Fails when no predicate can be built for the requester.
    fn filter(
        &self,
        requester: &Requester,
        scope_prefix: &str,
        action: &str,
    ) -> AppResult<VisibilityFilter>;
}

/// Builds visibility predicates from the requester's granted scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeAccessFilter;

impl AccessFilter for ScopeAccessFilter {
    fn filter(
        &self,
        requester: &Requester,
        scope_prefix: &str,
        action: &str,
    ) -> AppResult<VisibilityFilter> {
        if requester.org_id().is_none() {
            return Err(AppError::Forbidden(format!(
                "requester '{}' is not signed in to an organization",
                requester.user_id()
            )));
        }

        let wildcards = wildcard_scopes(scope_prefix);
        let mut ids = BTreeSet::new();
        for scope in requester.scopes_for(action) {
            if wildcards.iter().any(|wildcard| wildcard == scope) {
                return Ok(VisibilityFilter::Unrestricted);
            }

            if let Some(id) = scope
                .strip_prefix(scope_prefix)
                .and_then(|identifier| identifier.parse::<i64>().ok())
            {
                ids.insert(id);
            }
        }

        if ids.is_empty() {
            return Ok(VisibilityFilter::Nothing);
        }

        Ok(VisibilityFilter::Only(ids.into_iter().collect()))
    }
}

// `users:id:` is covered by `*`, `users:*` and `users:id:*`.
fn wildcard_scopes(scope_prefix: &str) -> Vec<String> {
    let mut wildcards = vec![WILDCARD_SCOPE.to_owned()];
    let mut covered = String::new();
    for segment in scope_prefix.trim_end_matches(':').split(':') {
        covered.push_str(segment);
        covered.push(':');
        wildcards.push(format!("{covered}{WILDCARD_SCOPE}"));
    }
    wildcards
}

#[cfg(test)]
mod tests {
    use scopegate_core::{OrgId, Requester};

    use super::{
        ACTION_TEAMS_READ, AccessFilter, ScopeAccessFilter, TEAMS_ID_PREFIX, VisibilityFilter,
    };

    #[test]
    fn wildcard_scope_makes_filter_unrestricted() {
        for scope in ["*", "teams:*", "teams:id:*"] {
            let requester =
                Requester::new(1, OrgId::new(1)).with_permission(ACTION_TEAMS_READ, [scope]);
            let filter = ScopeAccessFilter.filter(&requester, TEAMS_ID_PREFIX, ACTION_TEAMS_READ);
            assert_eq!(filter.ok(), Some(VisibilityFilter::Unrestricted), "{scope}");
        }
    }

    #[test]
    fn explicit_scopes_restrict_to_ids() {
        let requester = Requester::new(1, OrgId::new(1)).with_permission(
            ACTION_TEAMS_READ,
            ["teams:id:3", "teams:id:1", "teams:id:oops", "folders:uid:a"],
        );
        let filter = ScopeAccessFilter.filter(&requester, TEAMS_ID_PREFIX, ACTION_TEAMS_READ);
        assert_eq!(filter.ok(), Some(VisibilityFilter::Only(vec![1, 3])));
    }

    #[test]
    fn missing_permission_hides_everything() {
        let requester = Requester::new(1, OrgId::new(1));
        let filter = ScopeAccessFilter.filter(&requester, TEAMS_ID_PREFIX, ACTION_TEAMS_READ);
        assert_eq!(filter.ok(), Some(VisibilityFilter::Nothing));
    }

    #[test]
    fn requester_without_org_fails_closed() {
        let filter = ScopeAccessFilter.filter(
            &Requester::default(),
            TEAMS_ID_PREFIX,
            ACTION_TEAMS_READ,
        );
        assert!(filter.is_err());
    }

    #[test]
    fn visibility_filter_allows_listed_ids() {
        assert!(VisibilityFilter::Unrestricted.allows(9));
        assert!(VisibilityFilter::Only(vec![2]).allows(2));
        assert!(!VisibilityFilter::Only(vec![2]).allows(3));
        assert!(!VisibilityFilter::Nothing.allows(2));
    }
}
