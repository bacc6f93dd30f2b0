//! `teamsync sync`: run the reconciliation against GitHub and print the report.

use std::fmt::Write as _;

use anyhow::Context;
use tracing::debug;

use teamsync_core::sync::GroupAction;
use teamsync_core::{SyncReport, load_declaration, run_sync};
use teamsync_github::GithubClient;

use crate::config::TeamsyncConfig;

/// Output options for the `sync` command.
#[derive(Debug, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub json: bool,
}

/// Execute the sync and print the report to stdout.
///
/// Returns the report so the caller can decide the exit status.
pub async fn run_sync_command(
    config: &TeamsyncConfig,
    options: &SyncOptions,
) -> anyhow::Result<SyncReport> {
    let ctx = config.sync_context(options.dry_run)?;
    let declaration = load_declaration(&config.file)
        .with_context(|| format!("invalid declaration file {}", config.file.display()))?;
    debug!(file = %config.file.display(), teams = declaration.len(), "loaded declaration");
    let client = GithubClient::new(config.github_config()?)?;

    let report = run_sync(&client, &ctx, &declaration).await?;

    if options.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(report)
}

/// Human-readable report, one block per team.
pub fn render_report(report: &SyncReport) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { " (dry run)" } else { "" };

    let _ = writeln!(out, "Sync of {}{mode}, run {}", report.scope, report.run_id);
    let _ = writeln!(out);

    for group in &report.groups {
        let action = match group.action {
            Some(GroupAction::Created) => "created",
            Some(GroupAction::Updated) => "updated",
            Some(GroupAction::Ignored) => "ignored",
            None if group.error.is_some() => "failed",
            None => "-",
        };
        let _ = writeln!(
            out,
            "  {:<30} {:<24} {action}",
            group.full_name,
            group.state.to_string()
        );

        for login in &group.added {
            let _ = writeln!(out, "      + {login}");
        }
        for login in &group.removed {
            let _ = writeln!(out, "      - {login}");
        }
        for login in &group.not_eligible {
            let _ = writeln!(out, "      ~ {login} (not an organization member)");
        }
        for failure in &group.membership_failures {
            let _ = writeln!(
                out,
                "      ! {} {}: {}",
                failure.op, failure.login, failure.message
            );
        }
        if let Some(error) = &group.error {
            let _ = writeln!(out, "      error: {error}");
        }
    }

    let failed = report.failed_groups().len();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} team(s): {} converged, {} ignored, {} failed",
        report.groups.len(),
        report.converged_count(),
        report.ignored_count(),
        failed
    );
    out
}
