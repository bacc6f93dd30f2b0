//! Declaration parser with validation.
//!
//! The document is a YAML mapping of team name to team entry:
//!
//! ```yaml
//! platform:
//!   description: Platform engineering
//!   parent_group: engineering
//!   members:
//!     - login: alice
//!     - login: bob
//! legacy:
//!   sync_ignored: true
//!   members: []
//! ```
//!
//! Validation is all-or-nothing: any error means no groups are returned.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::{Declaration, GroupRecord};

/// Key holding the member login inside each member record.
const LOGIN_FIELD: &str = "login";

/// Errors that can occur while reading or validating a declaration.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("failed to read declaration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML syntax error: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("group {group:?} has an invalid members list: {detail}")]
    InvalidMemberRecord { group: String, detail: String },

    #[error("group {group:?}: field {field:?} must be a {expected}")]
    InvalidFieldType {
        group: String,
        field: String,
        expected: &'static str,
    },

    #[error("groups {first:?} and {second:?} both map to slug {slug:?}")]
    SlugCollision {
        first: String,
        second: String,
        slug: String,
    },

    #[error("group name {0:?} does not produce a usable slug")]
    UnusableName(String),
}

/// Parse and validate a YAML declaration document.
pub fn parse_document(content: &str) -> Result<Declaration, DeclarationError> {
    let value: Value = serde_yaml::from_str(content)?;
    parse_value(&value)
}

/// Validate an already-parsed YAML tree.
pub fn parse_value(value: &Value) -> Result<Declaration, DeclarationError> {
    let Value::Mapping(root) = value else {
        return Err(DeclarationError::MalformedDocument(format!(
            "root must be a mapping of group names, found {}",
            kind_of(value)
        )));
    };

    let mut groups = Vec::with_capacity(root.len());
    for (key, entry) in root {
        let name = key.as_str().ok_or_else(|| {
            DeclarationError::MalformedDocument(format!(
                "group names must be strings, found {}",
                kind_of(key)
            ))
        })?;

        let Value::Mapping(fields) = entry else {
            return Err(DeclarationError::MalformedDocument(format!(
                "group {name:?} must be a mapping, found {}",
                kind_of(entry)
            )));
        };

        groups.push(parse_group(name, fields)?);
    }

    Ok(Declaration::new(groups))
}

fn parse_group(name: &str, fields: &Mapping) -> Result<GroupRecord, DeclarationError> {
    Ok(GroupRecord {
        name: name.to_owned(),
        members: parse_members(name, fields)?,
        description: optional_string(name, fields, "description")?,
        parent_group: optional_string(name, fields, "parent_group")?,
        sync_ignored: optional_bool(name, fields, "sync_ignored")?.unwrap_or(false),
    })
}

fn parse_members(group: &str, fields: &Mapping) -> Result<Vec<String>, DeclarationError> {
    let invalid = |detail: String| DeclarationError::InvalidMemberRecord {
        group: group.to_owned(),
        detail,
    };

    let entries = match fields.get("members") {
        Some(Value::Sequence(entries)) => entries,
        Some(other) => return Err(invalid(format!("expected a sequence, found {}", kind_of(other)))),
        None => return Err(invalid("missing `members`".to_owned())),
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let login = entry
                .get(LOGIN_FIELD)
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("entry {i} has no string `{LOGIN_FIELD}`")))?;
            if !is_valid_login(login) {
                return Err(invalid(format!("entry {i} has an invalid `{LOGIN_FIELD}` {login:?}")));
            }
            Ok(login.to_owned())
        })
        .collect()
}

/// A login must be usable as a single URL path segment.
fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login != "."
        && login != ".."
        && !login
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
}

fn optional_string(
    group: &str,
    fields: &Mapping,
    field: &str,
) -> Result<Option<String>, DeclarationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DeclarationError::InvalidFieldType {
            group: group.to_owned(),
            field: field.to_owned(),
            expected: "string",
        }),
    }
}

fn optional_bool(
    group: &str,
    fields: &Mapping,
    field: &str,
) -> Result<Option<bool>, DeclarationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(DeclarationError::InvalidFieldType {
            group: group.to_owned(),
            field: field.to_owned(),
            expected: "boolean",
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
