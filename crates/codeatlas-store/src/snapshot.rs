use codeatlas_core::{Node, NodeId, Relationship};
use std::collections::HashMap;

/// A self-contained, immutable view of the graph taken once under the
/// store's read lock: the traversal copies the adjacency lists it needs
/// into its own working set while holding the read lock, then releases the
/// lock before serializing results. `GraphStore::snapshot` copies the whole
/// node/adjacency state rather than a per-call subset — simpler than
/// computing the minimal working set per traversal, and still gives C3/C8
/// a lock-free, immutable view to walk at their own pace.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) node_order: Vec<NodeId>,
    pub(crate) outgoing: HashMap<NodeId, Vec<Relationship>>,
    pub(crate) incoming: HashMap<NodeId, Vec<Relationship>>,
}

impl GraphSnapshot {
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Outgoing relationships from `id`, in insertion order. Empty for an
    /// absent node (traversals treat this as "no neighbours", not an error).
    pub fn outgoing(&self, id: &NodeId) -> &[Relationship] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming relationships to `id`, in insertion order.
    pub fn incoming(&self, id: &NodeId) -> &[Relationship] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }
}
