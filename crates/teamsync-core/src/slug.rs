//! Team naming: prefix application and slug normalization.
//!
//! The provider addresses teams by slug, so the slug computed here is the
//! one used for both the existence lookup and the update call.

/// Apply the optional name prefix to a declared group name.
///
/// The prefix is trimmed first; an empty prefix leaves the name untouched.
pub fn full_name(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}-{name}")
    }
}

/// Normalize a team name into its slug.
///
/// ASCII letters and digits are lowercased, `_` is kept, and every other
/// run of characters collapses into a single `-`. Leading and trailing
/// separators are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prefix_keeps_name() {
        assert_eq!(full_name("", "Platform"), "Platform");
        assert_eq!(full_name("   ", "Platform"), "Platform");
    }

    #[test]
    fn prefix_is_trimmed_and_joined() {
        assert_eq!(full_name("  eng ", "Platform"), "eng-Platform");
    }

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Platform Team"), "platform-team");
        assert_eq!(slugify("SRE / On-Call"), "sre-on-call");
    }

    #[test]
    fn slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("  --Data--Infra--  "), "data-infra");
        assert_eq!(slugify("a...b"), "a-b");
    }

    #[test]
    fn slugify_keeps_underscores_and_digits() {
        assert_eq!(slugify("team_42"), "team_42");
    }

    #[test]
    fn slugify_of_punctuation_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }
}
