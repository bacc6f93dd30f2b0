//! The reconciliation run: validates the declaration, builds the run-wide
//! index, then reconciles every declared team in document order.
//!
//! Teams are processed one at a time. A failure on one team is recorded in
//! its [`GroupOutcome`] and the run moves on; only problems that make every
//! team unsafe to process (invalid document, index or identity lookup
//! failures) abort the run.

pub mod membership;
pub mod reader;
pub mod reconciler;
pub mod report;
pub mod state;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::context::{CredentialKind, SyncContext};
use crate::declaration::{Declaration, DeclarationError};
use crate::provider::{GroupProvider, ProviderError};

pub use membership::{MembershipDelta, MembershipFailure, MembershipOp, MembershipResult};
pub use reader::{GroupIndex, RemoteState};
pub use report::{GroupAction, GroupOutcome, SyncReport};
pub use state::{GroupState, GroupStateMachine};

/// Errors raised while syncing.
///
/// `Declaration`, `IndexBuild` and `IdentityLookup` abort the run; the
/// remaining variants are scoped to a single team.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("failed to list existing teams in {scope:?}: {source}")]
    IndexBuild {
        scope: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to look up the identity behind the credential: {0}")]
    IdentityLookup(#[source] ProviderError),

    #[error("failed to read team {slug:?}: {source}")]
    RemoteReadFailure {
        slug: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to {action} team {slug:?}: {source}")]
    RemoteWriteFailure {
        slug: String,
        action: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("invalid state transition for team {group:?}: {from} -> {to}")]
    InvalidTransition {
        group: String,
        from: GroupState,
        to: GroupState,
    },
}

/// Run a full reconciliation of `declaration` against the provider.
pub async fn run_sync(
    provider: &dyn GroupProvider,
    ctx: &SyncContext,
    declaration: &Declaration,
) -> Result<SyncReport, SyncError> {
    declaration.check_slugs(&ctx.prefix)?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(
        run_id = %run_id,
        scope = %ctx.scope,
        teams = declaration.len(),
        allow_invite = ctx.allow_invite,
        dry_run = ctx.dry_run,
        "starting team sync"
    );

    let creator = match ctx.credential_kind {
        CredentialKind::Personal => provider
            .current_identity()
            .await
            .map_err(SyncError::IdentityLookup)?,
        CredentialKind::App => None,
    };

    let index = GroupIndex::build(provider, &ctx.scope)
        .await
        .map_err(|source| SyncError::IndexBuild {
            scope: ctx.scope.clone(),
            source,
        })?;

    let mut groups = Vec::with_capacity(declaration.len());
    for record in declaration {
        let outcome =
            reconciler::reconcile_group(provider, ctx, &index, creator.as_deref(), record).await;
        groups.push(outcome);
    }

    let report = SyncReport {
        run_id,
        scope: ctx.scope.clone(),
        dry_run: ctx.dry_run,
        started_at,
        finished_at: Utc::now(),
        groups,
    };

    info!(
        run_id = %run_id,
        converged = report.converged_count(),
        ignored = report.ignored_count(),
        failed = report.failed_groups().len(),
        "team sync finished"
    );

    Ok(report)
}
