//! Coarse-grained permission names that expand to concrete actions.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use scopegate_core::AppError;
use serde::{Deserialize, Serialize};

/// Permission tiers an action set may be named after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionTier {
    /// Full control.
    Admin,
    /// Modify the resource.
    Edit,
    /// Modify the resource, named after the built-in editor role.
    Editor,
    /// Read the resource.
    View,
    /// Query the resource.
    Query,
    /// Membership of the resource.
    Member,
}

impl PermissionTier {
    /// Returns the stable lower-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Edit => "edit",
            Self::Editor => "editor",
            Self::View => "view",
            Self::Query => "query",
            Self::Member => "member",
        }
    }
}

impl FromStr for PermissionTier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "edit" => Ok(Self::Edit),
            "editor" => Ok(Self::Editor),
            "view" => Ok(Self::View),
            "query" => Ok(Self::Query),
            "member" => Ok(Self::Member),
            _ => Err(AppError::Validation(format!(
                "'{value}' is not an allowed permission tier"
            ))),
        }
    }
}

impl Display for PermissionTier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A virtual action `resource:tier` standing for a list of concrete actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet {
    action: String,
    resource: String,
    tier: PermissionTier,
    scope: String,
    actions: Vec<String>,
}

impl ActionSet {
    /// Builds an action set; resource and scope are lower-cased.
    #[must_use]
    pub fn new(
        resource: &str,
        tier: PermissionTier,
        scope: &str,
        actions: Vec<String>,
    ) -> Self {
        let resource = resource.to_lowercase();
        Self {
            action: format!("{resource}:{tier}"),
            resource,
            tier,
            scope: scope.to_lowercase(),
            actions,
        }
    }

    /// Returns the virtual action name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the permission tier.
    #[must_use]
    pub fn tier(&self) -> PermissionTier {
        self.tier
    }

    /// Returns the scope the set was synthesized for.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.scope.as_str()
    }

    /// Returns the concrete actions the set expands to.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        self.actions.as_slice()
    }

    /// Returns whether the set expands to the given concrete action.
    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.actions.iter().any(|value| value == action)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ActionSet, PermissionTier};

    #[test]
    fn tier_parsing_is_case_insensitive() {
        assert_eq!(
            PermissionTier::from_str("Admin").unwrap_or(PermissionTier::View),
            PermissionTier::Admin
        );
        assert!(PermissionTier::from_str("superadmin").is_err());
        assert!(PermissionTier::from_str("viewer").is_err());
    }

    #[test]
    fn action_set_name_is_resource_and_tier() {
        let action_set = ActionSet::new(
            "Folders",
            PermissionTier::Edit,
            "Folders:UID:*",
            vec!["folders:write".to_owned()],
        );
        assert_eq!(action_set.action(), "folders:edit");
        assert_eq!(action_set.scope(), "folders:uid:*");
        assert!(action_set.contains("folders:write"));
        assert!(!action_set.contains("folders:delete"));
    }
}
