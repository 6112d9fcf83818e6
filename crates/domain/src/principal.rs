//! Principals that can hold resource grants and their managed role names.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use scopegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::scope::MANAGED_ROLE_PREFIX;

const MANAGED_ROLE_SUFFIX: &str = ":permissions";

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from a stored value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying stored value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a team record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(i64);

impl TeamId {
    /// Creates a team identifier from a stored value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying stored value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TeamId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Organization roles every member holds one of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuiltinRole {
    /// Member without a basic role.
    None,
    /// Read-only member.
    Viewer,
    /// Member allowed to edit content.
    Editor,
    /// Organization administrator.
    Admin,
    /// Server-wide administrator.
    ServerAdmin,
}

impl BuiltinRole {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Admin => "Admin",
            Self::ServerAdmin => "Server Admin",
        }
    }

    /// Returns the lower-case form used inside managed role names.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::ServerAdmin => "server_admin",
        }
    }

    fn from_slug(value: &str) -> Option<Self> {
        [
            Self::None,
            Self::Viewer,
            Self::Editor,
            Self::Admin,
            Self::ServerAdmin,
        ]
        .into_iter()
        .find(|role| role.slug() == value)
    }
}

impl FromStr for BuiltinRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "None" => Ok(Self::None),
            "Viewer" => Ok(Self::Viewer),
            "Editor" => Ok(Self::Editor),
            "Admin" => Ok(Self::Admin),
            "Server Admin" => Ok(Self::ServerAdmin),
            _ => Err(AppError::Validation(format!("invalid role: {value}"))),
        }
    }
}

/// Discriminates the three assignment sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// Roles bound directly to a user.
    User,
    /// Roles bound to a team.
    Team,
    /// Roles bound to a built-in organization role.
    BuiltinRole,
}

impl PrincipalKind {
    /// Returns the segment used for this kind in managed role names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Team => "teams",
            Self::BuiltinRole => "builtins",
        }
    }
}

/// Grantee of a resource permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
    /// An individual user or service account.
    User(UserId),
    /// A team.
    Team(TeamId),
    /// Everyone holding a built-in role.
    BuiltinRole(BuiltinRole),
}

impl Principal {
    /// Returns the assignment source this principal belongs to.
    #[must_use]
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Self::User(_) => PrincipalKind::User,
            Self::Team(_) => PrincipalKind::Team,
            Self::BuiltinRole(_) => PrincipalKind::BuiltinRole,
        }
    }

    /// Returns the managed role that holds this principal's resource grants.
    #[must_use]
    pub fn managed_role_name(&self) -> ManagedRoleName {
        let subject = match self {
            Self::User(user_id) => user_id.to_string(),
            Self::Team(team_id) => team_id.to_string(),
            Self::BuiltinRole(role) => role.slug().to_owned(),
        };

        ManagedRoleName {
            kind: self.kind(),
            subject,
        }
    }
}

/// Decoded form of a managed role name such as `managed:users:1:permissions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagedRoleName {
    kind: PrincipalKind,
    subject: String,
}

impl ManagedRoleName {
    /// Decodes a stored role name.
    pub fn parse(value: &str) -> AppResult<Self> {
        let malformed =
            || AppError::Validation(format!("'{value}' is not a well-formed managed role name"));

        let inner = value
            .strip_prefix(MANAGED_ROLE_PREFIX)
            .and_then(|rest| rest.strip_suffix(MANAGED_ROLE_SUFFIX))
            .ok_or_else(malformed)?;
        let (kind, subject) = inner.split_once(':').ok_or_else(malformed)?;
        if subject.is_empty() || subject.contains(':') {
            return Err(malformed());
        }

        let kind = match kind {
            "users" => PrincipalKind::User,
            "teams" => PrincipalKind::Team,
            "builtins" => PrincipalKind::BuiltinRole,
            _ => return Err(malformed()),
        };

        Ok(Self {
            kind,
            subject: subject.to_owned(),
        })
    }

    /// Returns the assignment source encoded in the name.
    #[must_use]
    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    /// Returns the principal segment: user id, team id or built-in role slug.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the built-in role for `managed:builtins:*` names.
    #[must_use]
    pub fn builtin_role(&self) -> Option<BuiltinRole> {
        match self.kind {
            PrincipalKind::BuiltinRole => BuiltinRole::from_slug(self.subject.as_str()),
            PrincipalKind::User | PrincipalKind::Team => None,
        }
    }
}

impl Display for ManagedRoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{MANAGED_ROLE_PREFIX}{}:{}{MANAGED_ROLE_SUFFIX}",
            self.kind.as_str(),
            self.subject
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{BuiltinRole, ManagedRoleName, Principal, PrincipalKind, TeamId, UserId};

    #[test]
    fn managed_role_names_follow_reserved_convention() {
        assert_eq!(
            Principal::User(UserId::new(1)).managed_role_name().to_string(),
            "managed:users:1:permissions"
        );
        assert_eq!(
            Principal::Team(TeamId::new(4)).managed_role_name().to_string(),
            "managed:teams:4:permissions"
        );
        assert_eq!(
            Principal::BuiltinRole(BuiltinRole::Editor)
                .managed_role_name()
                .to_string(),
            "managed:builtins:editor:permissions"
        );
    }

    #[test]
    fn managed_role_name_roundtrips() {
        let name = Principal::BuiltinRole(BuiltinRole::ServerAdmin).managed_role_name();
        let parsed = ManagedRoleName::parse(name.to_string().as_str());
        assert!(parsed.is_ok());

        let parsed = parsed.unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed.kind(), PrincipalKind::BuiltinRole);
        assert_eq!(parsed.builtin_role(), Some(BuiltinRole::ServerAdmin));
    }

    #[test]
    fn malformed_managed_role_names_are_rejected() {
        for value in [
            "fixed:users:1:permissions",
            "managed:users:1",
            "managed:users::permissions",
            "managed:robots:1:permissions",
            "managed:builtins:editor:extra:permissions",
        ] {
            assert!(ManagedRoleName::parse(value).is_err(), "{value}");
        }
    }

    #[test]
    fn unknown_builtin_role_is_rejected() {
        assert!(BuiltinRole::from_str("Owner").is_err());
        assert_eq!(
            BuiltinRole::from_str("Server Admin").unwrap_or(BuiltinRole::None),
            BuiltinRole::ServerAdmin
        );
    }
}
