use codeatlas_core::{Node, NodeId, Relationship, RelationshipKind};
use serde::{Deserialize, Serialize};

/// The `{type: "node"|"edge", id|triple: ...}` delete payload the parser
/// feed uses to signal removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeleteTarget {
    Node { id: NodeId },
    Edge { triple: EdgeTriple },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTriple {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub kind: RelationshipKind,
}

/// One unit of a parser message stream. `progress`/`end` carry no payload
/// and are observed but not applied;
/// `end` is the per-batch terminator the coordinator's caller watches for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ParserMessageKind {
    Node(Node),
    Edge(Relationship),
    Delete(DeleteTarget),
    Progress,
    End,
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserMessage {
    pub batch_id: String,
    #[serde(flatten)]
    pub kind: ParserMessageKind,
}
