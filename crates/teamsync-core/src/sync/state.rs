//! Per-team reconciliation state machine.

use std::fmt;

use serde::Serialize;

use super::SyncError;

/// How far a single team got through reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    Unsynced,
    CreatePending,
    UpdatePending,
    StructureSynced,
    MembershipReconciling,
    Converged,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unsynced => "unsynced",
            Self::CreatePending => "create_pending",
            Self::UpdatePending => "update_pending",
            Self::StructureSynced => "structure_synced",
            Self::MembershipReconciling => "membership_reconciling",
            Self::Converged => "converged",
        };
        f.write_str(s)
    }
}

/// Tracks one team's state and enforces the transition graph:
///
/// ```text
/// unsynced               -> create_pending
/// unsynced               -> update_pending
/// create_pending         -> structure_synced
/// update_pending         -> structure_synced
/// structure_synced       -> membership_reconciling
/// membership_reconciling -> converged
/// ```
///
/// A failure simply stops advancing, so the last state reached is the last
/// step that succeeded.
#[derive(Debug)]
pub struct GroupStateMachine {
    group: String,
    state: GroupState,
}

impl GroupStateMachine {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            state: GroupState::Unsynced,
        }
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    /// Check whether `from -> to` is an edge of the graph.
    pub fn is_valid_transition(from: GroupState, to: GroupState) -> bool {
        matches!(
            (from, to),
            (GroupState::Unsynced, GroupState::CreatePending)
                | (GroupState::Unsynced, GroupState::UpdatePending)
                | (GroupState::CreatePending, GroupState::StructureSynced)
                | (GroupState::UpdatePending, GroupState::StructureSynced)
                | (GroupState::StructureSynced, GroupState::MembershipReconciling)
                | (GroupState::MembershipReconciling, GroupState::Converged)
        )
    }

    pub fn advance(&mut self, to: GroupState) -> Result<(), SyncError> {
        if !Self::is_valid_transition(self.state, to) {
            return Err(SyncError::InvalidTransition {
                group: self.group.clone(),
                from: self.state,
                to,
            });
        }
        tracing::debug!(group = %self.group, from = %self.state, to = %to, "team state transition");
        self.state = to;
        Ok(())
    }
}
