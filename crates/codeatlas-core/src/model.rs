use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Opaque key/value metadata bag (docstring, byte range, parser flags, ...).
/// Typed access to known keys happens at whichever boundary needs it.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Function,
    Method,
    Class,
    Module,
    Import,
    Variable,
    Other,
}

impl NodeKind {
    /// Stable lowercase label, used both for serializing non-string map keys
    /// (histograms) and for the canonical id constructor's `kind` component.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Class => "class",
            NodeKind::Module => "module",
            NodeKind::Import => "import",
            NodeKind::Variable => "variable",
            NodeKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Calls,
    Imports,
    Contains,
    References,
    Seam,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Calls => "calls",
            RelationshipKind::Imports => "imports",
            RelationshipKind::Contains => "contains",
            RelationshipKind::References => "references",
            RelationshipKind::Seam => "seam",
        }
    }
}

/// A code entity. Identity equality and hashing are by `id` alone: two
/// `Node`s with the same id but different attributes are still "the same
/// node" for set/map purposes, which is exactly what lets `UpsertNode`
/// recognize a re-insert as an update rather than a new entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub language: String,
    pub file: String,
    pub line: u32,
    pub end_line: u32,
    pub complexity: u32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Node {
    /// Attribute-wise equality, used by `UpsertNode` to decide `Unchanged`
    /// vs `Updated`. Deliberately distinct from `PartialEq`, which is
    /// identity-only.
    pub fn same_attributes(&self, other: &Node) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.language == other.language
            && self.file == other.file
            && self.line == other.line
            && self.end_line == other.end_line
            && self.complexity == other.complexity
            && self.metadata == other.metadata
    }
}

/// A directed typed edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_id: NodeId,
    pub target_id: NodeId,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub is_seam: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Relationship {
    /// The `(sourceId, targetId, type)` triple that defines relationship
    /// identity.
    pub fn key(&self) -> (NodeId, NodeId, RelationshipKind) {
        (self.source_id.clone(), self.target_id.clone(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, complexity: u32) -> Node {
        Node {
            id: NodeId::from(id),
            name: "handle".into(),
            kind: NodeKind::Function,
            language: "python".into(),
            file: "a.py".into(),
            line: 1,
            end_line: 2,
            complexity,
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn node_equality_is_identity_only() {
        let a = node("function:a.py:handle:1", 1);
        let b = node("function:a.py:handle:1", 99);
        assert_eq!(a, b, "nodes with the same id must be equal regardless of attributes");
        assert!(!a.same_attributes(&b));
    }
}
