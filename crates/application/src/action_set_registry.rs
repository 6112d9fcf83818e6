//! Process-lifetime registry of action sets.

use std::collections::HashMap;
use std::str::FromStr;

use scopegate_core::{AppError, AppResult};
use scopegate_domain::{ActionSet, PermissionTier};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory registry mapping `resource:tier` names to action sets.
///
/// Entries are never persisted and are immutable once created.
#[derive(Debug, Default)]
pub struct ActionSetRegistry {
    action_sets: RwLock<HashMap<String, ActionSet>>,
}

impl ActionSetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            action_sets: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new action set named `<resource>:<tier>`.
    pub async fn create_action_set(
        &self,
        resource: &str,
        tier: &str,
        scope: &str,
        actions: Vec<String>,
    ) -> AppResult<ActionSet> {
        let action_set = ActionSet::new(resource, PermissionTier::from_str(tier)?, scope, actions);
        let mut action_sets = self.action_sets.write().await;

        if action_sets.contains_key(action_set.action()) {
            return Err(AppError::Conflict(format!(
                "action set '{}' already exists",
                action_set.action()
            )));
        }

        debug!(action = action_set.action(), "created action set");
        action_sets.insert(action_set.action().to_owned(), action_set.clone());
        Ok(action_set)
    }

    /// Returns the registered set for `<resource>:<tier>`, creating it when absent.
    ///
    /// An existing entry is returned unchanged even when `actions` differ.
    pub async fn get_or_create_action_set(
        &self,
        resource: &str,
        tier: &str,
        scope: &str,
        actions: Vec<String>,
    ) -> AppResult<ActionSet> {
        let action_set = ActionSet::new(resource, PermissionTier::from_str(tier)?, scope, actions);
        let mut action_sets = self.action_sets.write().await;

        if let Some(existing) = action_sets.get(action_set.action()) {
            return Ok(existing.clone());
        }

        debug!(action = action_set.action(), "created action set");
        action_sets.insert(action_set.action().to_owned(), action_set.clone());
        Ok(action_set)
    }

    /// Returns the action set registered under an exact name.
    pub async fn get_action_set(&self, action: &str) -> AppResult<ActionSet> {
        self.action_sets
            .read()
            .await
            .get(action)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("action '{action}' is not an action set")))
    }

    /// Removes an action set; absent names are ignored.
    pub async fn delete_action_set(&self, action: &str) {
        self.action_sets.write().await.remove(action);
    }

    /// Returns every action set expanding to the given concrete action, ordered by name.
    pub async fn reverse_look_up(&self, action: &str) -> Vec<ActionSet> {
        let mut matching: Vec<ActionSet> = self
            .action_sets
            .read()
            .await
            .values()
            .filter(|action_set| action_set.contains(action))
            .cloned()
            .collect();
        matching.sort_by(|left, right| left.action().cmp(right.action()));
        matching
    }
}
