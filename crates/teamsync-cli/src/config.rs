//! Configuration file management for teamsync.
//!
//! Provides a TOML-based config file at `~/.config/teamsync/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use teamsync_core::{CredentialKind, SyncContext};
use teamsync_github::GithubConfig;

/// Declaration path used when nothing else is configured.
pub const DEFAULT_FILE: &str = ".github/teams.yml";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GithubSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<CredentialKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_invite: Option<bool>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the teamsync config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/teamsync` or
/// `~/.config/teamsync`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("teamsync");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("teamsync")
}

/// Return the path to the teamsync config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Load the config file from its default location, if there is one.
///
/// A missing file is not an error; a file that exists but does not parse is.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold a token.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub file: Option<PathBuf>,
    pub org: Option<String>,
    pub prefix: Option<String>,
    pub allow_invite: Option<bool>,
    pub token_type: Option<CredentialKind>,
    pub api_url: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct TeamsyncConfig {
    pub file: PathBuf,
    pub org: Option<String>,
    pub token: Option<String>,
    pub token_type: CredentialKind,
    pub api_url: String,
    pub prefix: String,
    pub allow_invite: bool,
}

impl TeamsyncConfig {
    /// Resolve from the process environment and the default config file.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file_config = load_config()?;
        Self::resolve_with(cli, file_config.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - file: `--file` > `TEAMSYNC_FILE` > `sync.file` > [`DEFAULT_FILE`]
    /// - org: `--org` > `TEAMSYNC_ORG` > `github.org`
    /// - token: `TEAMSYNC_TOKEN` > `GITHUB_TOKEN` > `github.token`
    /// - token type: `--token-type` > `TEAMSYNC_TOKEN_TYPE` > `github.token_type` > personal
    /// - API URL: `--api-url` > `TEAMSYNC_API_URL` > `github.api_url` > public API
    /// - prefix: `--prefix` > `TEAMSYNC_PREFIX` > `sync.prefix` > empty
    /// - allow invite: `--allow-invite` > `TEAMSYNC_ALLOW_INVITE` > `sync.allow_invite` > false
    pub fn resolve_with(
        cli: &CliOverrides,
        file_config: Option<&ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let github = file_config.map(|c| &c.github);
        let sync = file_config.map(|c| &c.sync);

        let file = cli
            .file
            .clone()
            .or_else(|| env("TEAMSYNC_FILE").map(PathBuf::from))
            .or_else(|| sync.and_then(|s| s.file.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));

        let org = cli
            .org
            .clone()
            .or_else(|| env("TEAMSYNC_ORG"))
            .or_else(|| github.and_then(|g| g.org.clone()));

        let token = env("TEAMSYNC_TOKEN")
            .or_else(|| env("GITHUB_TOKEN"))
            .or_else(|| github.and_then(|g| g.token.clone()))
            .filter(|t| !t.trim().is_empty());

        let token_type = match (cli.token_type, env("TEAMSYNC_TOKEN_TYPE")) {
            (Some(kind), _) => kind,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("invalid TEAMSYNC_TOKEN_TYPE {raw:?}"))?,
            (None, None) => github.and_then(|g| g.token_type).unwrap_or_default(),
        };

        let api_url = cli
            .api_url
            .clone()
            .or_else(|| env("TEAMSYNC_API_URL"))
            .or_else(|| github.and_then(|g| g.api_url.clone()))
            .unwrap_or_else(|| GithubConfig::DEFAULT_API_URL.to_owned());

        let prefix = cli
            .prefix
            .clone()
            .or_else(|| env("TEAMSYNC_PREFIX"))
            .or_else(|| sync.and_then(|s| s.prefix.clone()))
            .unwrap_or_default()
            .trim()
            .to_owned();

        let allow_invite = if let Some(flag) = cli.allow_invite {
            flag
        } else if let Some(raw) = env("TEAMSYNC_ALLOW_INVITE") {
            parse_bool(&raw).with_context(|| format!("invalid TEAMSYNC_ALLOW_INVITE {raw:?}"))?
        } else {
            sync.and_then(|s| s.allow_invite).unwrap_or(false)
        };

        Ok(Self {
            file,
            org,
            token,
            token_type,
            api_url,
            prefix,
            allow_invite,
        })
    }

    /// Engine context for a sync run. Requires an organization.
    pub fn sync_context(&self, dry_run: bool) -> Result<SyncContext> {
        let Some(org) = self.org.as_deref() else {
            bail!("organization not set; pass --org, set TEAMSYNC_ORG, or run `teamsync init`");
        };
        Ok(SyncContext::new(org)
            .with_prefix(&self.prefix)
            .with_allow_invite(self.allow_invite)
            .with_credential_kind(self.token_type)
            .with_dry_run(dry_run))
    }

    /// GitHub client configuration. Requires a token.
    pub fn github_config(&self) -> Result<GithubConfig> {
        let Some(token) = self.token.as_deref() else {
            bail!("GitHub token not found; set TEAMSYNC_TOKEN or GITHUB_TOKEN");
        };
        Ok(GithubConfig::new(token).with_api_url(self.api_url.as_str()))
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
