//! GitHub REST client implementing [`GroupProvider`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use teamsync_core::provider::{GroupProvider, GroupSummary, NewGroup, ProviderError};

use crate::config::GithubConfig;
use crate::models::{ApiError, CreateTeam, Membership, Team, UpdateTeam, User};

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Teams created by the sync are visible to the whole organization.
const TEAM_PRIVACY: &str = "closed";

/// GitHub API client bound to one token.
#[derive(Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    /// Build a client with auth and API-version headers preset.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Config` if the token is not a valid header
    /// value or the HTTP client cannot be created.
    pub fn new(config: GithubConfig) -> Result<Self, ProviderError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ProviderError::Config("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Join path segments onto the API base URL. Each segment is
    /// percent-encoded, so a `/` inside a login or slug cannot change the
    /// endpoint.
    fn url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let base = &self.config.api_url;
        let mut url = Url::parse(base)
            .map_err(|e| ProviderError::Config(format!("invalid API URL {base:?}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::Config(format!("API URL {base:?} cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ProviderError> {
        let response = self.send(self.http.get(self.url(segments)?)).await?;
        decode(ensure_success(response).await?).await
    }

    /// Follow `page=N` until a page comes back shorter than `PER_PAGE`.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Vec<T>, ProviderError> {
        let url = self.url(segments)?;
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let request = self
                .http
                .get(url.clone())
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let response = ensure_success(self.send(request).await?).await?;
            let batch: Vec<T> = decode(response).await?;
            let done = batch.len() < PER_PAGE;
            debug!(path = url.path(), page, count = batch.len(), "fetched page");
            items.extend(batch);
            if done {
                return Ok(items);
            }
            page += 1;
        }
    }
}

/// Turn a non-success response into `ProviderError::Http`, using the API's
/// `message` field when present.
async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(ProviderError::Http {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response
        .json()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

#[async_trait]
impl GroupProvider for GithubClient {
    #[instrument(skip(self))]
    async fn list_groups(&self, scope: &str) -> Result<Vec<GroupSummary>, ProviderError> {
        let teams: Vec<Team> = self.get_paginated(&["orgs", scope, "teams"]).await?;
        Ok(teams.into_iter().map(GroupSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_group_by_slug(
        &self,
        scope: &str,
        slug: &str,
    ) -> Result<Option<GroupSummary>, ProviderError> {
        match self.get_json::<Team>(&["orgs", scope, "teams", slug]).await {
            Ok(team) => Ok(Some(team.into())),
            Err(e) if e.is_status(StatusCode::NOT_FOUND.as_u16()) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn list_group_members(
        &self,
        scope: &str,
        slug: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let users: Vec<User> = self
            .get_paginated(&["orgs", scope, "teams", slug, "members"])
            .await?;
        Ok(users.into_iter().map(|u| u.login).collect())
    }

    #[instrument(skip(self))]
    async fn create_group(
        &self,
        scope: &str,
        group: &NewGroup,
    ) -> Result<GroupSummary, ProviderError> {
        let body = CreateTeam {
            name: &group.name,
            description: group.description.as_deref(),
            parent_team_id: group.parent_id,
            privacy: TEAM_PRIVACY,
        };
        let request = self.http.post(self.url(&["orgs", scope, "teams"])?).json(&body);
        let response = ensure_success(self.send(request).await?).await?;
        let team: Team = decode(response).await?;
        Ok(team.into())
    }

    #[instrument(skip(self))]
    async fn update_group(
        &self,
        scope: &str,
        slug: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), ProviderError> {
        let body = UpdateTeam { name, description };
        let request = self
            .http
            .patch(self.url(&["orgs", scope, "teams", slug])?)
            .json(&body);
        ensure_success(self.send(request).await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_membership(
        &self,
        scope: &str,
        slug: &str,
        login: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .put(self.url(&["orgs", scope, "teams", slug, "memberships", login])?)
            .json(&Membership { role: "member" });
        ensure_success(self.send(request).await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_membership(
        &self,
        scope: &str,
        slug: &str,
        login: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .delete(self.url(&["orgs", scope, "teams", slug, "memberships", login])?);
        ensure_success(self.send(request).await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_scope_member(&self, scope: &str, login: &str) -> Result<bool, ProviderError> {
        let request = self.http.get(self.url(&["orgs", scope, "members", login])?);
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => {
                let response = ensure_success(response).await?;
                Err(ProviderError::Decode(format!(
                    "unexpected status {} from organization membership check",
                    response.status()
                )))
            }
        }
    }

    #[instrument(skip(self))]
    async fn current_identity(&self) -> Result<Option<String>, ProviderError> {
        let user: User = self.get_json(&["user"]).await?;
        Ok(Some(user.login))
    }
}
