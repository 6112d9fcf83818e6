//! Resolved, externally visible grants of one principal on one resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the principal a grant was resolved for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrincipalDetails {
    /// A user or service account.
    User {
        /// User id.
        user_id: i64,
        /// Login name.
        login: String,
        /// Email address.
        email: String,
        /// Whether the user is a service account.
        is_service_account: bool,
    },
    /// A team.
    Team {
        /// Team id.
        team_id: i64,
        /// Team name.
        name: String,
        /// Team email address.
        email: String,
    },
    /// A built-in organization role.
    BuiltinRole {
        /// Stored role value, e.g. `Editor`.
        role: String,
    },
}

impl PrincipalDetails {
    /// Returns the grouping key identifying the principal.
    #[must_use]
    pub fn key(&self) -> PrincipalKey {
        match self {
            Self::User { user_id, .. } => PrincipalKey::User(*user_id),
            Self::Team { team_id, .. } => PrincipalKey::Team(*team_id),
            Self::BuiltinRole { role } => PrincipalKey::BuiltinRole(role.clone()),
        }
    }

    /// Returns whether the principal is a service account.
    #[must_use]
    pub fn is_service_account(&self) -> bool {
        matches!(
            self,
            Self::User {
                is_service_account: true,
                ..
            }
        )
    }
}

/// Identity used to group grants by principal.
///
/// Ordering places users before teams before built-in roles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrincipalKey {
    /// User id.
    User(i64),
    /// Team id.
    Team(i64),
    /// Built-in role value.
    BuiltinRole(String),
}

/// Resolved grant of one principal on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermission {
    /// Id of the first contributing permission row.
    pub id: i64,
    /// Name of the role holding the grant.
    pub role_name: String,
    /// Granted actions.
    pub actions: Vec<String>,
    /// Stored scope of the grant.
    pub scope: String,
    /// Principal the grant resolves to.
    pub principal: PrincipalDetails,
    /// Creation timestamp of the first contributing row.
    pub created_at: DateTime<Utc>,
    /// Update timestamp of the first contributing row.
    pub updated_at: DateTime<Utc>,
    /// Managed grant on the exact scope.
    pub is_managed: bool,
    /// Managed grant on another scope.
    pub is_inherited: bool,
    /// Grant held by a service account.
    pub is_service_account: bool,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{PrincipalDetails, PrincipalKey, ResourcePermission};

    #[test]
    fn principal_keys_order_users_before_teams_before_roles() {
        let mut keys = vec![
            PrincipalKey::BuiltinRole("Viewer".to_owned()),
            PrincipalKey::Team(1),
            PrincipalKey::User(9),
            PrincipalKey::User(2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                PrincipalKey::User(2),
                PrincipalKey::User(9),
                PrincipalKey::Team(1),
                PrincipalKey::BuiltinRole("Viewer".to_owned()),
            ]
        );
    }

    #[test]
    fn serialized_view_tags_principal_kind() {
        let now = Utc::now();
        let permission = ResourcePermission {
            id: 1,
            role_name: "managed:teams:3:permissions".to_owned(),
            actions: vec!["folders:read".to_owned()],
            scope: "folders:uid:a".to_owned(),
            principal: PrincipalDetails::Team {
                team_id: 3,
                name: "ops".to_owned(),
                email: "ops@example.com".to_owned(),
            },
            created_at: now,
            updated_at: now,
            is_managed: true,
            is_inherited: false,
            is_service_account: false,
        };

        let value = serde_json::to_value(&permission).unwrap_or_default();
        assert_eq!(value["principal"]["kind"], "team");
        assert_eq!(value["principal"]["team_id"], 3);
        assert_eq!(value["is_managed"], true);
    }
}
