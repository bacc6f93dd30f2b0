//! Membership delta computation and application.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::context::SyncContext;
use crate::provider::{GroupProvider, ProviderError};

/// Logins to add and remove, by exact (case-sensitive) comparison.
///
/// The two sets are disjoint by construction. Iteration is sorted so the
/// provider sees calls in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl MembershipDelta {
    /// `to_add = desired - current`, `to_remove = current - desired`.
    pub fn compute(current: &[String], desired: &[String]) -> Self {
        let current: BTreeSet<&String> = current.iter().collect();
        let desired: BTreeSet<&String> = desired.iter().collect();

        Self {
            to_add: desired.difference(&current).map(|s| (*s).clone()).collect(),
            to_remove: current.difference(&desired).map(|s| (*s).clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Which membership call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOp {
    Add,
    Remove,
}

impl fmt::Display for MembershipOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// A single login whose membership change did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipFailure {
    pub login: String,
    pub op: MembershipOp,
    pub message: String,
}

impl MembershipFailure {
    pub fn new(login: &str, op: MembershipOp, err: &ProviderError) -> Self {
        Self {
            login: login.to_owned(),
            op,
            message: err.to_string(),
        }
    }
}

/// What happened while applying a delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipResult {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Not in the organization and invitations are disabled.
    pub not_eligible: Vec<String>,
    pub failures: Vec<MembershipFailure>,
}

/// Remove one login from a team, honoring dry runs.
pub(crate) async fn remove_member(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    slug: &str,
    login: &str,
) -> Result<(), ProviderError> {
    if ctx.dry_run {
        info!(slug, login, "dry run: would remove member");
        return Ok(());
    }
    provider.remove_membership(&ctx.scope, slug, login).await?;
    info!(slug, login, "removed member");
    Ok(())
}

/// Apply a delta to a team. Individual failures are recorded and never
/// stop the remaining logins from being processed.
pub async fn apply_delta(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    slug: &str,
    delta: &MembershipDelta,
) -> MembershipResult {
    let mut result = MembershipResult::default();

    for login in &delta.to_remove {
        match remove_member(provider, ctx, slug, login).await {
            Ok(()) => result.removed.push(login.clone()),
            Err(err) => {
                warn!(slug, login = %login, error = %err, "failed to remove member");
                result
                    .failures
                    .push(MembershipFailure::new(login, MembershipOp::Remove, &err));
            }
        }
    }

    for login in &delta.to_add {
        if !ctx.allow_invite {
            match provider.is_scope_member(&ctx.scope, login).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(slug, login = %login, "not an organization member yet; skipping");
                    result.not_eligible.push(login.clone());
                    continue;
                }
                Err(err) => {
                    warn!(slug, login = %login, error = %err, "organization membership check failed");
                    result
                        .failures
                        .push(MembershipFailure::new(login, MembershipOp::Add, &err));
                    continue;
                }
            }
        }

        if ctx.dry_run {
            info!(slug, login = %login, "dry run: would add member");
            result.added.push(login.clone());
            continue;
        }

        match provider.add_membership(&ctx.scope, slug, login).await {
            Ok(()) => {
                info!(slug, login = %login, "added member");
                result.added.push(login.clone());
            }
            Err(err) => {
                warn!(slug, login = %login, error = %err, "failed to add member");
                result
                    .failures
                    .push(MembershipFailure::new(login, MembershipOp::Add, &err));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logins(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn delta_of_overlapping_sets() {
        let delta = MembershipDelta::compute(&logins(&["a", "b", "c"]), &logins(&["b", "c", "d"]));
        assert_eq!(delta.to_add, set(&["d"]));
        assert_eq!(delta.to_remove, set(&["a"]));
    }

    #[test]
    fn delta_ignores_input_order() {
        let expected = MembershipDelta::compute(&logins(&["a", "b", "c"]), &logins(&["b", "c", "d"]));
        let shuffled =
            MembershipDelta::compute(&logins(&["c", "a", "b"]), &logins(&["d", "c", "b"]));
        assert_eq!(expected, shuffled);
    }

    #[test]
    fn duplicates_collapse() {
        let delta = MembershipDelta::compute(&logins(&["a", "a"]), &logins(&["b", "b", "a"]));
        assert_eq!(delta.to_add, set(&["b"]));
        assert!(delta.to_remove.is_empty());
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let delta = MembershipDelta::compute(&logins(&["Alice"]), &logins(&["alice"]));
        assert_eq!(delta.to_add, set(&["alice"]));
        assert_eq!(delta.to_remove, set(&["Alice"]));
    }

    #[test]
    fn identical_sets_yield_empty_delta() {
        let delta = MembershipDelta::compute(&logins(&["a", "b"]), &logins(&["b", "a"]));
        assert!(delta.is_empty());
    }

    #[test]
    fn add_and_remove_are_disjoint() {
        let delta = MembershipDelta::compute(
            &logins(&["a", "b", "c", "x"]),
            &logins(&["c", "d", "x", "y"]),
        );
        assert!(delta.to_add.is_disjoint(&delta.to_remove));
    }

    #[test]
    fn failure_carries_provider_message() {
        let err = ProviderError::Http {
            status: 422,
            message: "Validation Failed".into(),
        };
        let failure = MembershipFailure::new("bob", MembershipOp::Add, &err);
        assert_eq!(failure.login, "bob");
        assert!(failure.message.contains("422"));
    }
}
