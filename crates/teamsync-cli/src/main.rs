mod check_cmd;
mod config;
mod sync_cmd;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use teamsync_core::CredentialKind;

use config::{CliOverrides, TeamsyncConfig};

#[derive(Parser)]
#[command(name = "teamsync", about = "Reconcile declared GitHub teams against an organization")]
struct Cli {
    /// Team declaration file (overrides TEAMSYNC_FILE env var)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a teamsync config file
    Init {
        /// Organization to manage teams in
        #[arg(long)]
        org: Option<String>,
        /// Credential kind of the token (personal or app)
        #[arg(long)]
        token_type: Option<CredentialKind>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Parse and validate the declaration file without contacting GitHub
    Check {
        /// Team name prefix used for slug collision checks
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Reconcile the organization's teams with the declaration file
    Sync {
        /// Organization to manage teams in
        #[arg(long)]
        org: Option<String>,
        /// Prefix prepended to every managed team name
        #[arg(long)]
        prefix: Option<String>,
        /// Add users who are not yet organization members (sends invitations).
        /// `--allow-invite=false` overrides an enabled env var or config file.
        #[arg(
            long,
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
            value_name = "BOOL"
        )]
        allow_invite: Option<bool>,
        /// Credential kind of the token (personal or app)
        #[arg(long)]
        token_type: Option<CredentialKind>,
        /// GitHub API base URL (GitHub Enterprise)
        #[arg(long)]
        api_url: Option<String>,
        /// Read remote state and report intended writes without making them
        #[arg(long)]
        dry_run: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
        /// Exit with status 2 if any team failed to converge
        #[arg(long)]
        fail_on_group_error: bool,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Execute the `teamsync init` command: write a config file.
fn cmd_init(
    org: Option<String>,
    token_type: Option<CredentialKind>,
    file: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        github: config::GithubSection {
            org: org.clone(),
            token: None,
            token_type,
            api_url: None,
        },
        sync: config::SyncSection {
            file: file.clone(),
            prefix: None,
            allow_invite: None,
        },
    };

    config::save_config_to(&cfg, &path)?;

    println!("Config written to {}", path.display());
    if let Some(org) = &org {
        println!("  github.org = {org}");
    }
    if let Some(kind) = token_type {
        println!("  github.token_type = {kind}");
    }
    if let Some(file) = &file {
        println!("  sync.file = {}", file.display());
    }
    println!();
    println!("Next: export TEAMSYNC_TOKEN and run `teamsync check`.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            org,
            token_type,
            force,
        } => {
            cmd_init(org, token_type, cli.file, force)?;
        }
        Commands::Check { prefix } => {
            let resolved = TeamsyncConfig::resolve(&CliOverrides {
                file: cli.file,
                prefix,
                ..CliOverrides::default()
            })?;
            check_cmd::run_check(&resolved.file, &resolved.prefix)?;
        }
        Commands::Sync {
            org,
            prefix,
            allow_invite,
            token_type,
            api_url,
            dry_run,
            json,
            fail_on_group_error,
        } => {
            let resolved = TeamsyncConfig::resolve(&CliOverrides {
                file: cli.file,
                org,
                prefix,
                allow_invite,
                token_type,
                api_url,
            })?;
            let options = sync_cmd::SyncOptions { dry_run, json };
            let report = sync_cmd::run_sync_command(&resolved, &options).await?;
            if fail_on_group_error && report.has_failures() {
                std::process::exit(2);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "teamsync", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "teamsync",
            "--file",
            "teams.yml",
            "sync",
            "--org",
            "acme",
            "--token-type",
            "app",
            "--dry-run",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("teams.yml")));
        match cli.command {
            Commands::Sync {
                org,
                token_type,
                dry_run,
                json,
                allow_invite,
                ..
            } => {
                assert_eq!(org.as_deref(), Some("acme"));
                assert_eq!(token_type, Some(CredentialKind::App));
                assert!(dry_run);
                assert!(json);
                assert_eq!(allow_invite, None);
            }
            _ => panic!("expected sync command"),
        }
    }

    fn parsed_allow_invite(args: &[&str]) -> Option<bool> {
        let argv = ["teamsync", "sync"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Sync { allow_invite, .. } => allow_invite,
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn allow_invite_accepts_explicit_value() {
        assert_eq!(parsed_allow_invite(&[]), None);
        assert_eq!(parsed_allow_invite(&["--allow-invite"]), Some(true));
        assert_eq!(parsed_allow_invite(&["--allow-invite=true"]), Some(true));
        assert_eq!(parsed_allow_invite(&["--allow-invite=false"]), Some(false));
    }

    #[test]
    fn invalid_token_type_is_rejected() {
        let result = Cli::try_parse_from(["teamsync", "sync", "--token-type", "robot"]);
        assert!(result.is_err());
    }
}
