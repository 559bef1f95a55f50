//! Dotted keys
//!
//! Keys name slots in the nameserver: one or more ASCII identifiers joined by
//! `.`, e.g. `app.user.name`. Identifiers start with a letter or `_` and may
//! contain letters, digits, `_` and `-`.

use crate::error::{Error, Result};

/// Regex fragment matching a single identifier
pub const IDENTIFIER: &str = r"[A-Za-z_][A-Za-z0-9_\-]*";

/// Whether `name` is a single identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

/// Whether `key` is a valid dotted key
pub fn is_valid(key: &str) -> bool {
    key.split('.').all(is_identifier)
}

/// Reject keys that are not dotted identifiers
pub fn validate(key: &str) -> Result<()> {
    if is_valid(key) {
        Ok(())
    } else {
        Err(Error::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// Join a namespace and a name; an absent namespace leaves the name as is
pub fn join(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(namespace) if !namespace.is_empty() => format!("{namespace}.{name}"),
        _ => name.to_string(),
    }
}

/// Split a key into its namespace and its last component
pub fn split_last(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("name", true)]
    #[case("app.user.name", true)]
    #[case("_private.x-y", true)]
    #[case("mpi.hosts2", true)]
    #[case("", false)]
    #[case("a..b", false)]
    #[case(".a", false)]
    #[case("a.", false)]
    #[case("2fast", false)]
    #[case("a b", false)]
    #[case("a.{b}", false)]
    fn validates_dotted_keys(#[case] key: &str, #[case] valid: bool) {
        assert_eq!(is_valid(key), valid, "key {key:?}");
    }

    #[test]
    fn join_and_split() {
        assert_eq!(join(Some("app"), "home"), "app.home");
        assert_eq!(join(None, "home"), "home");
        assert_eq!(split_last("a.b.c"), Some(("a.b", "c")));
        assert_eq!(split_last("a"), None);
    }
}
