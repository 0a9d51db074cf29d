use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable string identifier for a code entity.
///
/// Canonical form is `{kind}:{file}:{name}:{line}`, optionally followed by
/// `#{suffix}` to disambiguate overloads that would otherwise collide on the
/// same four components. Identity (`Eq`/`Hash`) for every downstream type
/// that carries a `NodeId` is defined purely in terms of this string — see
/// `Node`'s manual `PartialEq`/`Hash` impl in `model.rs`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Build a canonical id from its components, normalizing path separators
    /// to forward slashes and the `kind` tag to lowercase.
    ///
    /// Fails with `CoreError::InvalidIdentifier` when any component is empty
    /// or contains the `:` delimiter.
    pub fn build(
        kind: &str,
        file: &str,
        name: &str,
        line: u32,
        suffix: Option<&str>,
    ) -> Result<Self, CoreError> {
        for (label, value) in [("kind", kind), ("file", file), ("name", name)] {
            if value.is_empty() {
                return Err(CoreError::InvalidIdentifier(format!(
                    "{label} must not be empty"
                )));
            }
            if value.contains(':') {
                return Err(CoreError::InvalidIdentifier(format!(
                    "{label} must not contain the ':' delimiter: {value:?}"
                )));
            }
        }
        if let Some(suffix) = suffix
            && suffix.contains(':')
        {
            return Err(CoreError::InvalidIdentifier(format!(
                "suffix must not contain the ':' delimiter: {suffix:?}"
            )));
        }

        let normalized_file = file.replace('\\', "/");
        let normalized_kind = kind.to_ascii_lowercase();
        let mut id = format!("{normalized_kind}:{normalized_file}:{name}:{line}");
        if let Some(suffix) = suffix {
            id.push('#');
            id.push_str(suffix);
        }
        Ok(NodeId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_canonical_form() {
        let id = NodeId::build("Function", "src/a.py", "handle", 10, None).unwrap();
        assert_eq!(id.as_str(), "function:src/a.py:handle:10");
    }

    #[test]
    fn normalizes_backslash_paths() {
        let id = NodeId::build("function", "src\\a.py", "handle", 10, None).unwrap();
        assert_eq!(id.as_str(), "function:src/a.py:handle:10");
    }

    #[test]
    fn disambiguates_with_suffix() {
        let id = NodeId::build("function", "a.py", "handle", 10, Some("overload2")).unwrap();
        assert_eq!(id.as_str(), "function:a.py:handle:10#overload2");
    }

    #[test]
    fn rejects_empty_component() {
        let err = NodeId::build("", "a.py", "handle", 10, None).unwrap_err();
        assert_eq!(err.kind(), "invalid_identifier");
    }

    #[test]
    fn rejects_delimiter_in_component() {
        let err = NodeId::build("function", "a:py", "handle", 10, None).unwrap_err();
        assert_eq!(err.kind(), "invalid_identifier");
    }
}
