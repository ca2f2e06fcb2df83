//! Permission checking logic

use crate::permission::models::{Context, Permission, Scheme};

/// Result of a single permission evaluation, produced fresh per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// At least one permission grants the scheme
    Allowed,
    /// Nothing grants the scheme
    Denied {
        /// Why access was refused
        reason: String,
    },
}

impl PermissionOutcome {
    /// Check if access was granted
    pub fn is_allowed(&self) -> bool {
        matches!(self, PermissionOutcome::Allowed)
    }
}

/// Stateless evaluator for scheme + context grants
pub struct PermissionChecker;

impl PermissionChecker {
    /// Check whether `permissions` grant `required` in any of `contexts`
    ///
    /// # Arguments
    /// * `permissions` - Everything the caller holds
    /// * `required` - Scheme the action needs
    /// * `contexts` - Contexts the target resource lives in
    pub fn check(
        permissions: &[Permission],
        required: &Scheme,
        contexts: &[Context],
    ) -> PermissionOutcome {
        if permissions
            .iter()
            .any(|permission| permission.grants(required, contexts))
        {
            return PermissionOutcome::Allowed;
        }

        let scoped: Vec<String> = contexts.iter().map(ToString::to_string).collect();
        PermissionOutcome::Denied {
            reason: format!("{required} not granted in [{}]", scoped.join(", ")),
        }
    }
}
