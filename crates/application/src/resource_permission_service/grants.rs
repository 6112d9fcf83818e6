use std::collections::BTreeSet;

use chrono::Utc;
use scopegate_core::{AppError, AppResult, OrgId};
use scopegate_domain::{
    ActionSet, BuiltinRole, Principal, PrincipalKind, TeamId, UserId, split_scope,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::grant_merger::fold_grants;
use crate::{NewPermission, NewRole, PermissionRecord, PermissionSession, RoleRecord};

use super::{
    GrantOutcome, GrantWarning, ResourcePermissionService, SetResourcePermissionCommand,
    SetResourcePermissionsCommand, ensure_principal_exists,
};

const ROLE_UID_ATTEMPTS: usize = 3;
const ROLE_UID_LENGTH: usize = 14;

impl ResourcePermissionService {
    /// Reconciles a user's managed grant on a resource.
    pub async fn set_user_resource_permission(
        &self,
        org_id: OrgId,
        user_id: UserId,
        command: SetResourcePermissionCommand,
    ) -> AppResult<GrantOutcome> {
        self.set_resource_permission(org_id, Principal::User(user_id), command)
            .await
    }

    /// Reconciles a team's managed grant on a resource.
    pub async fn set_team_resource_permission(
        &self,
        org_id: OrgId,
        team_id: TeamId,
        command: SetResourcePermissionCommand,
    ) -> AppResult<GrantOutcome> {
        self.set_resource_permission(org_id, Principal::Team(team_id), command)
            .await
    }

    /// Reconciles a built-in role's managed grant on a resource.
    ///
    /// The server administrator role is rejected with a validation error.
    pub async fn set_builtin_resource_permission(
        &self,
        org_id: OrgId,
        builtin_role: BuiltinRole,
        command: SetResourcePermissionCommand,
    ) -> AppResult<GrantOutcome> {
        self.set_resource_permission(org_id, Principal::BuiltinRole(builtin_role), command)
            .await
    }

    /// Reconciles the principal's managed grant on a resource so that it
    /// holds exactly `command.actions`, in one transaction.
    ///
    /// The server administrator role is rejected here; only batches may grant to it.
    pub async fn set_resource_permission(
        &self,
        org_id: OrgId,
        principal: Principal,
        command: SetResourcePermissionCommand,
    ) -> AppResult<GrantOutcome> {
        if let Principal::BuiltinRole(BuiltinRole::ServerAdmin) = principal {
            return Err(AppError::Validation(format!(
                "invalid role: {}",
                BuiltinRole::ServerAdmin.as_str()
            )));
        }
        ensure_principal_exists(&principal)?;

        let mut session = self.repository.begin_transaction().await?;
        let outcome = self
            .apply_grant(session.as_mut(), org_id, &principal, &command)
            .await?;
        session.commit().await?;

        Ok(outcome)
    }

    /// Reconciles several grants in one transaction; the first failure aborts all of them.
    pub async fn set_resource_permissions(
        &self,
        org_id: OrgId,
        commands: Vec<SetResourcePermissionsCommand>,
    ) -> AppResult<Vec<GrantOutcome>> {
        let mut session = self.repository.begin_transaction().await?;
        let mut outcomes = Vec::with_capacity(commands.len());

        for entry in &commands {
            ensure_principal_exists(&entry.principal)?;
            let outcome = self
                .apply_grant(session.as_mut(), org_id, &entry.principal, &entry.command)
                .await?;
            outcomes.push(outcome);
        }

        session.commit().await?;
        Ok(outcomes)
    }

    async fn apply_grant(
        &self,
        session: &mut dyn PermissionSession,
        org_id: OrgId,
        principal: &Principal,
        command: &SetResourcePermissionCommand,
    ) -> AppResult<GrantOutcome> {
        let role = get_or_create_managed_role(session, org_id, principal).await?;
        let scope = command.resource.as_scope();

        let mut desired: BTreeSet<String> = command.actions.iter().cloned().collect();
        let mut warnings = Vec::new();
        if let Principal::BuiltinRole(builtin_role) = principal
            && !desired.is_empty()
        {
            match self.synthesize_action_set(*builtin_role, command, &scope).await {
                Ok(action_set) => {
                    desired.insert(action_set.action().to_owned());
                }
                Err(warning) => {
                    warn!(role = %role.name, scope = %scope, %warning, "granting without action set");
                    warnings.push(warning);
                }
            }
        }

        let current = session.list_permissions(role.id, &scope).await?;
        let diff = PermissionDiff::compute(&current, &desired);
        debug!(
            role = %role.name,
            scope = %scope,
            removed = diff.remove.len(),
            added = diff.add.len(),
            "reconciling resource permission"
        );

        if !diff.remove.is_empty() {
            session.delete_permissions(&diff.remove).await?;
        }

        if !diff.add.is_empty() {
            let now = Utc::now();
            let permissions = diff
                .add
                .into_iter()
                .map(|action| NewPermission {
                    role_id: role.id,
                    action,
                    scope: scope.clone(),
                    parts: split_scope(&scope),
                    created_at: now,
                    updated_at: now,
                })
                .collect();
            session.insert_permissions(permissions).await?;
        }

        if let Some(hook) = self.hooks.for_kind(principal.kind()) {
            hook.after_grant(
                session,
                org_id,
                principal,
                command.resource.identifier(),
                &command.permission,
            )
            .await?;
        }

        let rows = session.list_role_grants(role.id, &scope, principal).await?;
        Ok(GrantOutcome {
            permission: fold_grants(&scope, &rows),
            warnings,
        })
    }

    async fn synthesize_action_set(
        &self,
        builtin_role: BuiltinRole,
        command: &SetResourcePermissionCommand,
        scope: &str,
    ) -> Result<ActionSet, GrantWarning> {
        let resource = command.resource.resource();
        self.action_sets
            .get_or_create_action_set(resource, builtin_role.slug(), scope, command.actions.clone())
            .await
            .map_err(|error| GrantWarning::ActionSetUnavailable {
                resource: resource.to_owned(),
                tier: builtin_role.slug().to_owned(),
                reason: error.to_string(),
            })
    }
}

/// Minimal change turning stored actions into the desired set.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct PermissionDiff {
    /// Ids of rows whose action is not desired, including duplicate rows.
    pub(super) remove: Vec<i64>,
    /// Desired actions with no stored row, in sorted order.
    pub(super) add: Vec<String>,
}

impl PermissionDiff {
    pub(super) fn compute(current: &[PermissionRecord], desired: &BTreeSet<String>) -> Self {
        let mut missing = desired.clone();
        let mut remove = Vec::new();

        for permission in current {
            if !missing.remove(&permission.action) {
                remove.push(permission.id);
            }
        }

        Self {
            remove,
            add: missing.into_iter().collect(),
        }
    }
}

async fn get_or_create_managed_role(
    session: &mut dyn PermissionSession,
    org_id: OrgId,
    principal: &Principal,
) -> AppResult<RoleRecord> {
    let name = principal.managed_role_name().to_string();
    if let Some(role) = session.find_role(org_id, &name).await? {
        return Ok(role);
    }

    let uid = generate_role_uid(session, org_id).await?;
    let now = Utc::now();
    let role = session
        .insert_role(NewRole {
            org_id,
            name,
            uid,
            created_at: now,
            updated_at: now,
        })
        .await?;

    if session.assignment_exists(org_id, role.id, principal).await? {
        let holder = match principal.kind() {
            PrincipalKind::User => "user",
            PrincipalKind::Team => "team",
            PrincipalKind::BuiltinRole => "built-in role",
        };
        return Err(AppError::Conflict(format!(
            "role '{}' is already added to this {holder}",
            role.name
        )));
    }

    session
        .insert_assignment(org_id, role.id, principal, now)
        .await?;
    debug!(role = %role.name, org_id = %org_id, "created managed role");

    Ok(role)
}

async fn generate_role_uid(session: &mut dyn PermissionSession, org_id: OrgId) -> AppResult<String> {
    for _ in 0..ROLE_UID_ATTEMPTS {
        let mut uid = Uuid::new_v4().simple().to_string();
        uid.truncate(ROLE_UID_LENGTH);

        if !session.role_uid_exists(org_id, &uid).await? {
            return Ok(uid);
        }
    }

    Err(AppError::Internal(format!(
        "failed to generate a unique role uid in org '{org_id}'"
    )))
}
