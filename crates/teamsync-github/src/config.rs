use std::time::Duration;

/// GitHub API client configuration.
#[derive(Clone)]
pub struct GithubConfig {
    /// REST API root, without a trailing slash.
    pub api_url: String,
    /// Bearer token (personal access token or app installation token).
    pub token: String,
    pub user_agent: String,
    /// Per-request timeout. No retries are layered on top.
    pub timeout: Duration,
}

impl GithubConfig {
    /// Public GitHub API root, used when nothing else is configured.
    pub const DEFAULT_API_URL: &str = "https://api.github.com";

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_owned(),
            token: token.into(),
            user_agent: format!("teamsync/{}", env!("CARGO_PKG_VERSION")),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at another API root (GitHub Enterprise, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}
