//! The `GroupProvider` trait -- the seam between the engine and the remote
//! access-control system.
//!
//! ```text
//! run_sync
//!     |
//!     v
//! &dyn GroupProvider
//!     list_groups / get_group_by_slug / list_group_members   (reads)
//!     create_group / update_group                            (structure)
//!     add_membership / remove_membership / is_scope_member   (membership)
//!     current_identity
//! ```
//!
//! Implementations translate transport failures into [`ProviderError`].
//! "Not found" on the existence check is not an error: it is `Ok(None)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a provider implementation.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got an answer (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered but the body was not what we expected.
    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("provider misconfigured: {0}")]
    Config(String),
}

impl ProviderError {
    /// Whether this error carries the given HTTP status.
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, Self::Http { status, .. } if *status == code)
    }
}

/// A team as returned by listing and lookup calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Point-in-time snapshot of an existing team and its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGroup {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub member_identifiers: Vec<String>,
}

impl RemoteGroup {
    pub fn new(summary: GroupSummary, member_identifiers: Vec<String>) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            slug: summary.slug,
            member_identifiers,
        }
    }
}

/// Parameters for creating a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<u64>,
}

/// Remote operations consumed by the reconciliation engine.
///
/// `scope` is the enclosing organization. Every method is a single
/// logical remote call; implementations must not retry.
#[async_trait]
pub trait GroupProvider: Send + Sync {
    /// Enumerate every team in the scope (implementations page internally).
    async fn list_groups(&self, scope: &str) -> Result<Vec<GroupSummary>, ProviderError>;

    /// Look up a team by slug; `Ok(None)` when it does not exist.
    async fn get_group_by_slug(
        &self,
        scope: &str,
        slug: &str,
    ) -> Result<Option<GroupSummary>, ProviderError>;

    /// Current member logins of a team.
    async fn list_group_members(&self, scope: &str, slug: &str)
    -> Result<Vec<String>, ProviderError>;

    async fn create_group(
        &self,
        scope: &str,
        group: &NewGroup,
    ) -> Result<GroupSummary, ProviderError>;

    async fn update_group(
        &self,
        scope: &str,
        slug: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), ProviderError>;

    /// Add (or invite) a login to a team.
    async fn add_membership(&self, scope: &str, slug: &str, login: &str)
    -> Result<(), ProviderError>;

    async fn remove_membership(
        &self,
        scope: &str,
        slug: &str,
        login: &str,
    ) -> Result<(), ProviderError>;

    /// Whether the login already belongs to the scope itself.
    async fn is_scope_member(&self, scope: &str, login: &str) -> Result<bool, ProviderError>;

    /// Login behind the credential, if the credential has one.
    async fn current_identity(&self) -> Result<Option<String>, ProviderError>;
}

// Compile-time assertion: GroupProvider must be usable as `dyn GroupProvider`.
const _: () = {
    fn _assert_object_safe(_: &dyn GroupProvider) {}
};
