//! Remote state reads: the run-wide name index and per-team snapshots.

use std::collections::HashMap;

use crate::provider::{GroupProvider, ProviderError, RemoteGroup};

/// Read-only team name -> id mapping, built once before any team is
/// processed. Only used to resolve parent references at creation time.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    by_name: HashMap<String, u64>,
}

impl GroupIndex {
    /// List every team in the scope and index it by name.
    pub async fn build(provider: &dyn GroupProvider, scope: &str) -> Result<Self, ProviderError> {
        let groups = provider.list_groups(scope).await?;
        tracing::info!(scope, teams = groups.len(), "indexed existing teams");
        Ok(groups.into_iter().map(|g| (g.name, g.id)).collect())
    }

    pub fn resolve(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<(String, u64)> for GroupIndex {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        Self {
            by_name: iter.into_iter().collect(),
        }
    }
}

/// What the provider currently holds for a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    Absent,
    Present(RemoteGroup),
}

/// Fetch a team and, when it exists, its member list.
///
/// Absence is a normal outcome; every other failure is returned as-is.
pub async fn fetch_remote_state(
    provider: &dyn GroupProvider,
    scope: &str,
    slug: &str,
) -> Result<RemoteState, ProviderError> {
    let Some(summary) = provider.get_group_by_slug(scope, slug).await? else {
        return Ok(RemoteState::Absent);
    };

    let members = provider.list_group_members(scope, slug).await?;
    Ok(RemoteState::Present(RemoteGroup::new(summary, members)))
}
