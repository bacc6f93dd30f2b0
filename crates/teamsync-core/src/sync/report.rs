//! Run report: one outcome per declared team.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::membership::{MembershipFailure, MembershipResult};
use super::state::GroupState;
use crate::declaration::GroupRecord;

/// Structural action taken for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    Created,
    Updated,
    Ignored,
}

/// Result of reconciling one declared team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOutcome {
    /// Declared name.
    pub name: String,
    /// Name with the prefix applied, as sent to the provider.
    pub full_name: String,
    pub slug: String,
    pub state: GroupState,
    pub action: Option<GroupAction>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub not_eligible: Vec<String>,
    pub membership_failures: Vec<MembershipFailure>,
    /// Team-level failure that stopped reconciliation.
    pub error: Option<String>,
}

impl GroupOutcome {
    pub(crate) fn new(record: &GroupRecord, full_name: String, slug: String) -> Self {
        Self {
            name: record.name.clone(),
            full_name,
            slug,
            state: GroupState::Unsynced,
            action: None,
            added: Vec::new(),
            removed: Vec::new(),
            not_eligible: Vec::new(),
            membership_failures: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn absorb(&mut self, result: MembershipResult) {
        self.added.extend(result.added);
        self.removed.extend(result.removed);
        self.not_eligible.extend(result.not_eligible);
        self.membership_failures.extend(result.failures);
    }

    pub fn is_converged(&self) -> bool {
        self.state == GroupState::Converged
    }

    pub fn is_ignored(&self) -> bool {
        self.action == Some(GroupAction::Ignored)
    }

    pub fn has_failures(&self) -> bool {
        self.error.is_some() || !self.membership_failures.is_empty()
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub scope: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub groups: Vec<GroupOutcome>,
}

impl SyncReport {
    pub fn group(&self, name: &str) -> Option<&GroupOutcome> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn converged_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_converged()).count()
    }

    pub fn ignored_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_ignored()).count()
    }

    pub fn failed_groups(&self) -> Vec<&GroupOutcome> {
        self.groups.iter().filter(|g| g.has_failures()).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.groups.iter().any(GroupOutcome::has_failures)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
