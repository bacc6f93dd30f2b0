//! Reconcile one declared team: structure first, then membership.

use tracing::{error, info, warn};

use super::membership::{self, MembershipDelta, MembershipFailure, MembershipOp};
use super::reader::{self, GroupIndex, RemoteState};
use super::report::{GroupAction, GroupOutcome};
use super::state::{GroupState, GroupStateMachine};
use super::SyncError;
use crate::context::SyncContext;
use crate::declaration::GroupRecord;
use crate::provider::{GroupProvider, NewGroup};
use crate::slug;

/// Reconcile a single team. Never fails: problems are recorded in the
/// returned outcome so sibling teams keep going.
///
/// `creator` is the login behind a personal credential. The provider
/// enrolls it into every team it creates, so it is removed right after
/// creation, before any declared member is touched.
pub async fn reconcile_group(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    index: &GroupIndex,
    creator: Option<&str>,
    record: &GroupRecord,
) -> GroupOutcome {
    let full_name = slug::full_name(&ctx.prefix, &record.name);
    let slug = slug::slugify(&full_name);
    let mut outcome = GroupOutcome::new(record, full_name, slug);

    if record.sync_ignored {
        info!(group = %record.name, "sync_ignored is set; leaving team untouched");
        outcome.action = Some(GroupAction::Ignored);
        return outcome;
    }

    let mut machine = GroupStateMachine::new(&record.name);
    let result = drive(provider, ctx, index, creator, record, &mut machine, &mut outcome).await;
    outcome.state = machine.state();

    if let Err(err) = result {
        error!(group = %record.name, slug = %outcome.slug, error = %err, "team reconciliation failed");
        outcome.error = Some(err.to_string());
    }

    outcome
}

async fn drive(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    index: &GroupIndex,
    creator: Option<&str>,
    record: &GroupRecord,
    machine: &mut GroupStateMachine,
    outcome: &mut GroupOutcome,
) -> Result<(), SyncError> {
    let remote = reader::fetch_remote_state(provider, &ctx.scope, &outcome.slug)
        .await
        .map_err(|source| SyncError::RemoteReadFailure {
            slug: outcome.slug.clone(),
            source,
        })?;

    // The membership step works from this snapshot, not a fresh read.
    let current = match remote {
        RemoteState::Absent => {
            machine.advance(GroupState::CreatePending)?;
            let slug = create_group(provider, ctx, index, record, outcome).await?;
            outcome.slug = slug;
            outcome.action = Some(GroupAction::Created);

            if let Some(login) = creator {
                match membership::remove_member(provider, ctx, &outcome.slug, login).await {
                    Ok(()) => outcome.removed.push(login.to_owned()),
                    Err(err) => {
                        warn!(slug = %outcome.slug, login, error = %err, "failed to remove creator from new team");
                        outcome
                            .membership_failures
                            .push(MembershipFailure::new(login, MembershipOp::Remove, &err));
                    }
                }
            }
            Vec::new()
        }
        RemoteState::Present(group) => {
            machine.advance(GroupState::UpdatePending)?;
            update_group(provider, ctx, record, outcome).await?;
            outcome.action = Some(GroupAction::Updated);
            group.member_identifiers
        }
    };
    machine.advance(GroupState::StructureSynced)?;

    machine.advance(GroupState::MembershipReconciling)?;
    let delta = MembershipDelta::compute(&current, &record.members);
    if delta.is_empty() {
        info!(slug = %outcome.slug, "membership already up to date");
    }
    let result = membership::apply_delta(provider, ctx, &outcome.slug, &delta).await;
    outcome.absorb(result);

    if outcome.membership_failures.is_empty() {
        machine.advance(GroupState::Converged)?;
    }
    Ok(())
}

/// Create the team and return the slug the provider assigned to it.
async fn create_group(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    index: &GroupIndex,
    record: &GroupRecord,
    outcome: &GroupOutcome,
) -> Result<String, SyncError> {
    let parent_id = record
        .parent_group
        .as_deref()
        .and_then(|parent| resolve_parent(ctx, index, &record.name, parent));

    let new_group = NewGroup {
        name: outcome.full_name.clone(),
        description: record.description.clone(),
        parent_id,
    };

    if ctx.dry_run {
        info!(slug = %outcome.slug, parent_id = ?parent_id, "dry run: would create team");
        return Ok(outcome.slug.clone());
    }

    let created = provider
        .create_group(&ctx.scope, &new_group)
        .await
        .map_err(|source| SyncError::RemoteWriteFailure {
            slug: outcome.slug.clone(),
            action: "create",
            source,
        })?;
    info!(slug = %created.slug, id = created.id, parent_id = ?parent_id, "created team");
    Ok(created.slug)
}

/// Resolve a parent reference by its prefixed name. Teams outside the
/// prefix are never linked. An unknown parent is not an error; the team is
/// created without one.
fn resolve_parent(ctx: &SyncContext, index: &GroupIndex, group: &str, parent: &str) -> Option<u64> {
    let full_name = slug::full_name(&ctx.prefix, parent);
    let resolved = index.resolve(&full_name);
    if resolved.is_none() {
        warn!(group, parent = %full_name, "parent team not found; creating without a parent");
    }
    resolved
}

async fn update_group(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    record: &GroupRecord,
    outcome: &GroupOutcome,
) -> Result<(), SyncError> {
    if ctx.dry_run {
        info!(slug = %outcome.slug, "dry run: would update team name and description");
        return Ok(());
    }

    provider
        .update_group(
            &ctx.scope,
            &outcome.slug,
            &outcome.full_name,
            record.description.as_deref(),
        )
        .await
        .map_err(|source| SyncError::RemoteWriteFailure {
            slug: outcome.slug.clone(),
            action: "update",
            source,
        })?;
    info!(slug = %outcome.slug, "updated team");
    Ok(())
}
