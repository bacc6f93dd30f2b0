//! `teamsync check`: validate a declaration file offline.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;

use teamsync_core::slug::{full_name, slugify};
use teamsync_core::{Declaration, load_declaration};

/// Parse the file, check slugs under `prefix`, and print a summary.
pub fn run_check(file: &Path, prefix: &str) -> anyhow::Result<()> {
    let declaration = load_declaration(file)
        .with_context(|| format!("invalid declaration file {}", file.display()))?;
    declaration
        .check_slugs(prefix)
        .with_context(|| format!("invalid declaration file {}", file.display()))?;

    print!("{}", render_summary(file, prefix, &declaration));
    Ok(())
}

fn render_summary(file: &Path, prefix: &str, declaration: &Declaration) -> String {
    let mut out = String::new();
    let ignored = declaration.iter().filter(|g| g.sync_ignored).count();

    let _ = writeln!(
        out,
        "{}: {} team(s), {} ignored",
        file.display(),
        declaration.len(),
        ignored
    );

    for group in declaration {
        let name = full_name(prefix, &group.name);
        let slug = slugify(&name);
        let mut line = format!("  {name} ({slug}): {} member(s)", group.members.len());
        if let Some(parent) = &group.parent_group {
            let _ = write!(line, ", parent {parent}");
        }
        if group.sync_ignored {
            line.push_str(", ignored");
        }
        let _ = writeln!(out, "{line}");
    }

    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use teamsync_core::parse_document;

    const DOC: &str = "\
core:
  description: Core maintainers
  members:
    - login: alice
    - login: bob
docs:
  parent_group: core
  members:
    - login: carol
legacy:
  sync_ignored: true
  members: []
";

    #[test]
    fn summary_lists_each_team() {
        let declaration = parse_document(DOC).unwrap();
        let out = render_summary(Path::new("teams.yml"), "eng", &declaration);

        assert!(out.starts_with("teams.yml: 3 team(s), 1 ignored\n"), "got:\n{out}");
        assert!(out.contains("  eng-core (eng-core): 2 member(s)\n"), "got:\n{out}");
        assert!(out.contains("  eng-docs (eng-docs): 1 member(s), parent core\n"), "got:\n{out}");
        assert!(out.contains("  eng-legacy (eng-legacy): 0 member(s), ignored\n"), "got:\n{out}");
    }

    #[test]
    fn check_accepts_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        run_check(file.path(), "").unwrap();
    }

    #[test]
    fn check_rejects_slug_collision() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Core Team:\n  members: []\ncore-team:\n  members: []\n")
            .unwrap();

        let err = run_check(file.path(), "").unwrap_err();
        assert!(format!("{err:#}").contains("core-team"), "got: {err:#}");
    }

    #[test]
    fn check_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = run_check(&tmp.path().join("absent.yml"), "").unwrap_err();
        assert!(format!("{err:#}").contains("absent.yml"), "got: {err:#}");
    }
}
