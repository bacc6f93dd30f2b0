//! Declared team membership: record types, YAML parsing, file loading.

pub mod parser;

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::slug;

pub use parser::{DeclarationError, parse_document, parse_value};

/// One declared team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    /// Declared name, before any prefix is applied.
    pub name: String,
    /// Desired member logins in document order. Duplicates are kept.
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name (not id) of the parent team, applied only at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_group: Option<String>,
    /// When set, the team is left alone entirely.
    pub sync_ignored: bool,
}

/// The parsed document: group records in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Declaration {
    groups: Vec<GroupRecord>,
}

impl Declaration {
    pub(crate) fn new(groups: Vec<GroupRecord>) -> Self {
        Self { groups }
    }

    /// Iterate over the records in document order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupRecord> {
        self.groups.iter()
    }

    /// Look up a record by its declared name.
    pub fn get(&self, name: &str) -> Option<&GroupRecord> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Verify that every group maps to a distinct, non-empty slug once the
    /// prefix is applied.
    ///
    /// Ignored groups take part too: a collision with an ignored team would
    /// still make another declaration overwrite it.
    pub fn check_slugs(&self, prefix: &str) -> Result<(), DeclarationError> {
        let mut seen: HashMap<String, &str> = HashMap::new();

        for group in &self.groups {
            let slug = slug::slugify(&slug::full_name(prefix, &group.name));
            if slug.is_empty() {
                return Err(DeclarationError::UnusableName(group.name.clone()));
            }
            if let Some(first) = seen.insert(slug.clone(), &group.name) {
                return Err(DeclarationError::SlugCollision {
                    first: first.to_owned(),
                    second: group.name.clone(),
                    slug,
                });
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Declaration {
    type Item = &'a GroupRecord;
    type IntoIter = std::slice::Iter<'a, GroupRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Read and parse a declaration file.
pub fn load_declaration(path: &Path) -> Result<Declaration, DeclarationError> {
    let content = std::fs::read_to_string(path).map_err(|source| DeclarationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> GroupRecord {
        GroupRecord {
            name: name.to_owned(),
            members: vec![],
            description: None,
            parent_group: None,
            sync_ignored: false,
        }
    }

    #[test]
    fn get_finds_by_declared_name() {
        let decl = Declaration::new(vec![record("a"), record("b")]);
        assert_eq!(decl.get("b").map(|g| g.name.as_str()), Some("b"));
        assert!(decl.get("c").is_none());
    }

    #[test]
    fn iteration_preserves_order() {
        let decl = Declaration::new(vec![record("zeta"), record("alpha"), record("mid")]);
        let names: Vec<&str> = decl.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn distinct_slugs_pass() {
        let decl = Declaration::new(vec![record("Platform"), record("Data")]);
        decl.check_slugs("").expect("no collision");
        decl.check_slugs("eng").expect("no collision with prefix");
    }

    #[test]
    fn colliding_slugs_are_rejected() {
        let decl = Declaration::new(vec![record("Platform Team"), record("platform-team")]);
        let err = decl.check_slugs("").unwrap_err();
        assert!(
            matches!(
                err,
                DeclarationError::SlugCollision { ref slug, .. } if slug == "platform-team"
            ),
            "expected SlugCollision, got: {err}"
        );
    }

    #[test]
    fn collision_with_ignored_group_is_still_rejected() {
        let mut ignored = record("ops");
        ignored.sync_ignored = true;
        let decl = Declaration::new(vec![ignored, record("OPS")]);
        assert!(decl.check_slugs("").is_err());
    }

    #[test]
    fn name_without_slug_characters_is_rejected() {
        let decl = Declaration::new(vec![record("???")]);
        let err = decl.check_slugs("").unwrap_err();
        assert!(matches!(err, DeclarationError::UnusableName(ref n) if n == "???"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("teams.yml");
        std::fs::write(&path, "core:\n  members:\n    - login: alice\n").unwrap();

        let decl = load_declaration(&path).expect("should load");
        assert_eq!(decl.len(), 1);
        assert_eq!(decl.get("core").unwrap().members, vec!["alice"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = load_declaration(&tmp.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, DeclarationError::Io { .. }), "got: {err}");
    }
}
