//! Resource scope addressing and grant classification.
//!
//! A scope is the canonical `resource:attribute:identifier` address of a
//! resource (`datasources:uid:1`) or resource class (`datasources:uid:*`).

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Scope matching every resource.
pub const WILDCARD_SCOPE: &str = "*";

/// Role-name prefix reserved for roles owned by resource permission management.
pub const MANAGED_ROLE_PREFIX: &str = "managed:";

/// Joins scope parts with `:`.
#[must_use]
pub fn scope<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (index, part) in parts.into_iter().enumerate() {
        if index > 0 {
            joined.push(':');
        }
        joined.push_str(part.as_ref());
    }
    joined
}

/// Address of one resource: kind, attribute used to identify it and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceScope {
    resource: String,
    attribute: String,
    identifier: String,
}

impl ResourceScope {
    /// Creates a resource scope.
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        attribute: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            attribute: attribute.into(),
            identifier: identifier.into(),
        }
    }

    /// Returns the resource kind, e.g. `datasources`.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the identifying attribute, e.g. `uid`.
    #[must_use]
    pub fn attribute(&self) -> &str {
        self.attribute.as_str()
    }

    /// Returns the resource identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Returns the canonical scope string.
    #[must_use]
    pub fn as_scope(&self) -> String {
        scope([
            self.resource.as_str(),
            self.attribute.as_str(),
            self.identifier.as_str(),
        ])
    }

    /// Returns every stored scope that grants access to this resource
    /// without naming an ancestor: the global wildcard, the resource-kind
    /// wildcards and the exact scope.
    #[must_use]
    pub fn candidate_scopes(&self) -> Vec<String> {
        vec![
            WILDCARD_SCOPE.to_owned(),
            scope([self.resource.as_str(), WILDCARD_SCOPE]),
            scope([
                self.resource.as_str(),
                self.attribute.as_str(),
                WILDCARD_SCOPE,
            ]),
            self.as_scope(),
        ]
    }
}

impl Display for ResourceScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_scope().as_str())
    }
}

/// Decomposed scope fields persisted next to each permission row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeParts {
    /// Resource kind.
    pub kind: String,
    /// Identifying attribute.
    pub attribute: String,
    /// Identifier; may itself contain `:`.
    pub identifier: String,
}

/// Splits a stored scope into kind, attribute and identifier.
///
/// Missing trailing parts default to `*`; an empty scope yields empty parts.
#[must_use]
pub fn split_scope(value: &str) -> ScopeParts {
    if value.is_empty() {
        return ScopeParts {
            kind: String::new(),
            attribute: String::new(),
            identifier: String::new(),
        };
    }

    let mut parts = value.splitn(3, ':');
    let kind = parts.next().unwrap_or(WILDCARD_SCOPE);
    let attribute = parts.next().unwrap_or(WILDCARD_SCOPE);
    let identifier = parts.next().unwrap_or(WILDCARD_SCOPE);

    ScopeParts {
        kind: kind.to_owned(),
        attribute: attribute.to_owned(),
        identifier: identifier.to_owned(),
    }
}

/// Returns whether a role name carries the managed-role prefix.
#[must_use]
pub fn is_managed_role_name(role_name: &str) -> bool {
    role_name.starts_with(MANAGED_ROLE_PREFIX)
}

/// How a stored grant relates to the scope being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantClassification {
    /// Managed grant stored directly on the target scope.
    Managed,
    /// Managed grant stored on another scope, typically an ancestor.
    Inherited,
    /// Grant not created through managed roles.
    Provisioned,
}

impl GrantClassification {
    /// Classifies a grant from its role name and stored scope relative to a target scope.
    #[must_use]
    pub fn classify(role_name: &str, stored_scope: &str, target_scope: &str) -> Self {
        match (is_managed_role_name(role_name), stored_scope == target_scope) {
            (true, true) => Self::Managed,
            (true, false) => Self::Inherited,
            (false, _) => Self::Provisioned,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{GrantClassification, ResourceScope, ScopeParts, scope, split_scope};

    #[test]
    fn resource_scope_joins_parts() {
        let resource = ResourceScope::new("datasources", "uid", "1");
        assert_eq!(resource.to_string(), "datasources:uid:1");
        assert_eq!(
            resource.candidate_scopes(),
            vec![
                "*".to_owned(),
                "datasources:*".to_owned(),
                "datasources:uid:*".to_owned(),
                "datasources:uid:1".to_owned(),
            ]
        );
    }

    #[test]
    fn split_scope_fills_missing_parts_with_wildcards() {
        assert_eq!(
            split_scope("folders:*"),
            ScopeParts {
                kind: "folders".to_owned(),
                attribute: "*".to_owned(),
                identifier: "*".to_owned(),
            }
        );
        assert_eq!(split_scope("*").attribute, "*");
        assert_eq!(split_scope("").kind, "");
    }

    #[test]
    fn split_scope_keeps_colons_in_identifier() {
        assert_eq!(split_scope("dashboards:uid:a:b").identifier, "a:b");
    }

    #[test]
    fn classification_depends_on_prefix_and_scope() {
        let target = "datasources:uid:1";
        assert_eq!(
            GrantClassification::classify("managed:users:1:permissions", target, target),
            GrantClassification::Managed
        );
        assert_eq!(
            GrantClassification::classify("managed:users:1:permissions", "folders:uid:a", target),
            GrantClassification::Inherited
        );
        assert_eq!(
            GrantClassification::classify("fixed:datasources:reader", target, target),
            GrantClassification::Provisioned
        );
    }

    proptest! {
        #[test]
        fn split_reverses_join(
            kind in "[a-z.]{1,12}",
            attribute in "[a-z*]{1,6}",
            identifier in "[a-zA-Z0-9:*-]{1,16}",
        ) {
            let parts = split_scope(&scope([&kind, &attribute, &identifier]));
            prop_assert_eq!(parts.kind, kind);
            prop_assert_eq!(parts.attribute, attribute);
            prop_assert_eq!(parts.identifier, identifier);
        }

        #[test]
        fn classification_is_exclusive(
            role_name in "(managed:)?[a-z:0-9]{0,16}",
            stored in "[a-z:0-9*]{1,12}",
            target in "[a-z:0-9*]{1,12}",
        ) {
            let classification = GrantClassification::classify(&role_name, &stored, &target);
            let managed = role_name.starts_with("managed:");
            let expected = if managed && stored == target {
                GrantClassification::Managed
            } else if managed {
                GrantClassification::Inherited
            } else {
                GrantClassification::Provisioned
            };
            prop_assert_eq!(classification, expected);
        }
    }
}
