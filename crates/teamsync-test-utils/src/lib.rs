//! Shared test utilities for teamsync integration tests.
//!
//! Provides [`FakeProvider`], an in-memory [`GroupProvider`] that behaves
//! like a small GitHub organization:
//!
//! - teams are addressed by slug and get sequential ids,
//! - creating a team enrolls the credential's identity as a member,
//! - every call is recorded in order for later assertions,
//! - failures can be injected per operation and target (slug or login).

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use teamsync_core::provider::{GroupProvider, GroupSummary, NewGroup, ProviderError};
use teamsync_core::slug::slugify;

/// Operation kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    ListGroups,
    GetGroup,
    ListMembers,
    CreateGroup,
    UpdateGroup,
    AddMembership,
    RemoveMembership,
    IsScopeMember,
    CurrentIdentity,
}

/// A recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListGroups,
    GetGroup { slug: String },
    ListMembers { slug: String },
    CreateGroup { name: String, description: Option<String>, parent_id: Option<u64> },
    UpdateGroup { slug: String, name: String, description: Option<String> },
    AddMembership { slug: String, login: String },
    RemoveMembership { slug: String, login: String },
    IsScopeMember { login: String },
    CurrentIdentity,
}

impl Call {
    /// Slug the call refers to, if any. Creation refers to the slug of the
    /// requested name.
    pub fn slug(&self) -> Option<String> {
        match self {
            Self::GetGroup { slug }
            | Self::ListMembers { slug }
            | Self::UpdateGroup { slug, .. }
            | Self::AddMembership { slug, .. }
            | Self::RemoveMembership { slug, .. } => Some(slug.clone()),
            Self::CreateGroup { name, .. } => Some(slugify(name)),
            Self::ListGroups | Self::IsScopeMember { .. } | Self::CurrentIdentity => None,
        }
    }

    /// Whether the call changes remote state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateGroup { .. }
                | Self::UpdateGroup { .. }
                | Self::AddMembership { .. }
                | Self::RemoveMembership { .. }
        )
    }
}

/// A team held by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeTeam {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<u64>,
    pub members: Vec<String>,
}

impl FakeTeam {
    fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

struct FailRule {
    op: Op,
    target: Option<String>,
}

#[derive(Default)]
struct FakeState {
    teams: Vec<FakeTeam>,
    org_members: HashSet<String>,
    identity: Option<String>,
    next_id: u64,
    calls: Vec<Call>,
    failures: Vec<FailRule>,
}

impl FakeState {
    fn team_mut(&mut self, slug: &str) -> Result<&mut FakeTeam, ProviderError> {
        self.teams
            .iter_mut()
            .find(|t| t.slug == slug)
            .ok_or_else(|| not_found(slug))
    }

    fn check(&self, op: Op, targets: &[&str]) -> Result<(), ProviderError> {
        let hit = self.failures.iter().any(|rule| {
            rule.op == op
                && rule
                    .target
                    .as_deref()
                    .is_none_or(|t| targets.contains(&t))
        });
        if hit {
            return Err(ProviderError::Http {
                status: 500,
                message: format!("injected {op:?} failure"),
            });
        }
        Ok(())
    }
}

fn not_found(what: &str) -> ProviderError {
    ProviderError::Http {
        status: 404,
        message: format!("{what} not found"),
    }
}

/// In-memory provider for engine tests.
pub struct FakeProvider {
    state: Mutex<FakeState>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1,
                ..FakeState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an existing team. Members are also made organization members.
    pub fn with_team(self, name: &str, members: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.teams.push(FakeTeam {
                id,
                name: name.to_owned(),
                slug: slugify(name),
                description: None,
                parent_id: None,
                members: members.iter().map(|m| (*m).to_owned()).collect(),
            });
            state.org_members.extend(members.iter().map(|m| (*m).to_owned()));
        }
        self
    }

    pub fn with_org_members(self, logins: &[&str]) -> Self {
        self.lock()
            .org_members
            .extend(logins.iter().map(|m| (*m).to_owned()));
        self
    }

    /// Identity returned by `current_identity`; it is enrolled into every
    /// team the fake creates.
    pub fn with_identity(self, login: &str) -> Self {
        self.lock().identity = Some(login.to_owned());
        self
    }

    /// Make every call of `op` fail.
    pub fn fail(self, op: Op) -> Self {
        self.lock().failures.push(FailRule { op, target: None });
        self
    }

    /// Make calls of `op` fail when they target `target` (a slug or login).
    pub fn fail_on(self, op: Op, target: &str) -> Self {
        self.lock().failures.push(FailRule {
            op,
            target: Some(target.to_owned()),
        });
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls referring to `slug`.
    pub fn calls_for(&self, slug: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.slug().as_deref() == Some(slug))
            .collect()
    }

    pub fn team(&self, slug: &str) -> Option<FakeTeam> {
        self.lock().teams.iter().find(|t| t.slug == slug).cloned()
    }

    /// Sorted member logins of a team, or `None` if it does not exist.
    pub fn members(&self, slug: &str) -> Option<Vec<String>> {
        self.team(slug).map(|t| {
            let mut members = t.members;
            members.sort();
            members
        })
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl GroupProvider for FakeProvider {
    async fn list_groups(&self, _scope: &str) -> Result<Vec<GroupSummary>, ProviderError> {
        self.record(Call::ListGroups);
        let state = self.lock();
        state.check(Op::ListGroups, &[])?;
        Ok(state.teams.iter().map(FakeTeam::summary).collect())
    }

    async fn get_group_by_slug(
        &self,
        _scope: &str,
        slug: &str,
    ) -> Result<Option<GroupSummary>, ProviderError> {
        self.record(Call::GetGroup { slug: slug.to_owned() });
        let state = self.lock();
        state.check(Op::GetGroup, &[slug])?;
        Ok(state.teams.iter().find(|t| t.slug == slug).map(FakeTeam::summary))
    }

    async fn list_group_members(
        &self,
        _scope: &str,
        slug: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.record(Call::ListMembers { slug: slug.to_owned() });
        let mut state = self.lock();
        state.check(Op::ListMembers, &[slug])?;
        Ok(state.team_mut(slug)?.members.clone())
    }

    async fn create_group(
        &self,
        _scope: &str,
        group: &NewGroup,
    ) -> Result<GroupSummary, ProviderError> {
        self.record(Call::CreateGroup {
            name: group.name.clone(),
            description: group.description.clone(),
            parent_id: group.parent_id,
        });
        let mut state = self.lock();
        let slug = slugify(&group.name);
        state.check(Op::CreateGroup, &[slug.as_str()])?;

        let id = state.next_id;
        state.next_id += 1;
        let team = FakeTeam {
            id,
            name: group.name.clone(),
            slug,
            description: group.description.clone(),
            parent_id: group.parent_id,
            members: state.identity.iter().cloned().collect(),
        };
        let summary = team.summary();
        state.teams.push(team);
        Ok(summary)
    }

    async fn update_group(
        &self,
        _scope: &str,
        slug: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.record(Call::UpdateGroup {
            slug: slug.to_owned(),
            name: name.to_owned(),
            description: description.map(str::to_owned),
        });
        let mut state = self.lock();
        state.check(Op::UpdateGroup, &[slug])?;
        let team = state.team_mut(slug)?;
        team.name = name.to_owned();
        team.description = description.map(str::to_owned);
        Ok(())
    }

    async fn add_membership(
        &self,
        _scope: &str,
        slug: &str,
        login: &str,
    ) -> Result<(), ProviderError> {
        self.record(Call::AddMembership {
            slug: slug.to_owned(),
            login: login.to_owned(),
        });
        let mut state = self.lock();
        state.check(Op::AddMembership, &[slug, login])?;
        let team = state.team_mut(slug)?;
        if !team.members.iter().any(|m| m == login) {
            team.members.push(login.to_owned());
        }
        Ok(())
    }

    async fn remove_membership(
        &self,
        _scope: &str,
        slug: &str,
        login: &str,
    ) -> Result<(), ProviderError> {
        self.record(Call::RemoveMembership {
            slug: slug.to_owned(),
            login: login.to_owned(),
        });
        let mut state = self.lock();
        state.check(Op::RemoveMembership, &[slug, login])?;
        state.team_mut(slug)?.members.retain(|m| m != login);
        Ok(())
    }

    async fn is_scope_member(&self, _scope: &str, login: &str) -> Result<bool, ProviderError> {
        self.record(Call::IsScopeMember { login: login.to_owned() });
        let state = self.lock();
        state.check(Op::IsScopeMember, &[login])?;
        Ok(state.org_members.contains(login))
    }

    async fn current_identity(&self) -> Result<Option<String>, ProviderError> {
        self.record(Call::CurrentIdentity);
        let state = self.lock();
        state.check(Op::CurrentIdentity, &[])?;
        Ok(state.identity.clone())
    }
}
