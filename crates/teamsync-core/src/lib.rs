//! Reconciliation engine for declared team membership.
//!
//! ```text
//! teams.yml --parse--> Declaration
//!                          |
//!                          v
//!   GroupProvider <--- run_sync(ctx) ---> SyncReport
//!   (list/get/create/update/add/remove/probe)
//! ```
//!
//! The engine never reads the environment: everything it needs arrives in
//! a [`SyncContext`] and a [`GroupProvider`] implementation.

pub mod context;
pub mod declaration;
pub mod provider;
pub mod slug;
pub mod sync;

pub use context::{CredentialKind, SyncContext};
pub use declaration::{Declaration, DeclarationError, GroupRecord, load_declaration, parse_document};
pub use provider::{GroupProvider, GroupSummary, NewGroup, ProviderError, RemoteGroup};
pub use sync::{GroupOutcome, GroupState, SyncError, SyncReport, run_sync};
