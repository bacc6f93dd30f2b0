//! Run configuration handed to the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of credential the provider client authenticates with.
///
/// Only personal credentials have an individual identity behind them, and
/// only that identity gets auto-enrolled into teams it creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    #[default]
    Personal,
    App,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Personal => "personal",
            Self::App => "app",
        };
        f.write_str(s)
    }
}

impl FromStr for CredentialKind {
    type Err = CredentialKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "app" => Ok(Self::App),
            other => Err(CredentialKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`CredentialKind`] string.
#[derive(Debug, Clone)]
pub struct CredentialKindParseError(pub String);

impl fmt::Display for CredentialKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid credential kind: {:?} (expected personal or app)", self.0)
    }
}

impl std::error::Error for CredentialKindParseError {}

/// Everything the engine needs to know about the run besides the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    /// Organization the teams live in.
    pub scope: String,
    /// Trimmed name prefix; empty means none.
    pub prefix: String,
    /// Add non-members directly (sending an org invitation) instead of
    /// skipping them.
    pub allow_invite: bool,
    pub credential_kind: CredentialKind,
    /// Perform reads only and log the writes that would have happened.
    pub dry_run: bool,
}

impl SyncContext {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            prefix: String::new(),
            allow_invite: false,
            credential_kind: CredentialKind::default(),
            dry_run: false,
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.trim().to_owned();
        self
    }

    pub fn with_allow_invite(mut self, allow_invite: bool) -> Self {
        self.allow_invite = allow_invite;
        self
    }

    pub fn with_credential_kind(mut self, kind: CredentialKind) -> Self {
        self.credential_kind = kind;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
