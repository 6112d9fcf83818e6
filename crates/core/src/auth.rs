use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::OrgId;

/// The signed-in principal on whose behalf a query runs.
///
/// Carries the principal's effective permissions as a map from action to
/// the scopes that action is granted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    user_id: i64,
    org_id: Option<OrgId>,
    permissions: HashMap<String, Vec<String>>,
}

impl Requester {
    /// Creates a requester for a user signed in to an organization.
    #[must_use]
    pub fn new(user_id: i64, org_id: OrgId) -> Self {
        Self {
            user_id,
            org_id: Some(org_id),
            permissions: HashMap::new(),
        }
    }

    /// Adds granted scopes for an action.
    #[must_use]
    pub fn with_permission<I, S>(mut self, action: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .entry(action.into())
            .or_default()
            .extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Returns the requesting user id.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns the organization the requester is signed in to, if any.
    #[must_use]
    pub fn org_id(&self) -> Option<OrgId> {
        self.org_id
    }

    /// Returns the scopes granted for an action.
    #[must_use]
    pub fn scopes_for(&self, action: &str) -> &[String] {
        self.permissions
            .get(action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::Requester;
    use crate::OrgId;

    #[test]
    fn scopes_accumulate_per_action() {
        let requester = Requester::new(7, OrgId::new(1))
            .with_permission("teams:read", ["teams:id:1"])
            .with_permission("teams:read", ["teams:id:2"]);

        assert_eq!(requester.scopes_for("teams:read").len(), 2);
        assert!(requester.scopes_for("org.users:read").is_empty());
    }

    #[test]
    fn default_requester_has_no_org() {
        assert!(Requester::default().org_id().is_none());
    }
}
