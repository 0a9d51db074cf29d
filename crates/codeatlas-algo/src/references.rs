use codeatlas_core::{Metadata, Node, NodeId, RelationshipKind};
use codeatlas_store::GraphSnapshot;
use serde::Serialize;
use std::collections::HashSet;

/// A one-hop neighbour together with the metadata carried on the
/// relationship that connects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborEdge {
    pub node: Node,
    pub metadata: Metadata,
}

/// Nodes that call `node_id` directly (one-hop incoming `calls` edges).
pub fn find_callers(snapshot: &GraphSnapshot, node_id: &NodeId) -> Vec<NeighborEdge> {
    snapshot
        .incoming(node_id)
        .iter()
        .filter(|rel| rel.kind == RelationshipKind::Calls)
        .filter_map(|rel| {
            snapshot.get_node(&rel.source_id).map(|node| NeighborEdge {
                node: node.clone(),
                metadata: rel.metadata.clone(),
            })
        })
        .collect()
}

/// Nodes that `node_id` calls directly (one-hop outgoing `calls` edges).
pub fn find_callees(snapshot: &GraphSnapshot, node_id: &NodeId) -> Vec<NeighborEdge> {
    snapshot
        .outgoing(node_id)
        .iter()
        .filter(|rel| rel.kind == RelationshipKind::Calls)
        .filter_map(|rel| {
            snapshot.get_node(&rel.target_id).map(|node| NeighborEdge {
                node: node.clone(),
                metadata: rel.metadata.clone(),
            })
        })
        .collect()
}

/// Every node with an edge of any type targeting a node named
/// `symbol_name`, deduplicated.
pub fn find_references(snapshot: &GraphSnapshot, symbol_name: &str) -> Vec<Node> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut result = Vec::new();
    for node in snapshot.nodes() {
        if node.name != symbol_name {
            continue;
        }
        for rel in snapshot.incoming(&node.id) {
            if let Some(source) = snapshot.get_node(&rel.source_id)
                && seen.insert(source.id.clone())
            {
                result.push(source.clone());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeatlas_core::{Node, NodeKind, Relationship};
    use codeatlas_events::{JournalConfig, NullSink, Publisher};
    use codeatlas_store::GraphStore;
    use std::sync::Arc;

    fn node(id: &str, name: &str) -> Node {
        Node {
            id: NodeId::from(id),
            name: name.to_string(),
            kind: NodeKind::Function,
            language: "python".into(),
            file: "f.py".into(),
            line: 1,
            end_line: 2,
            complexity: 1,
            metadata: Default::default(),
        }
    }

    fn rel(a: &str, b: &str, kind: RelationshipKind) -> Relationship {
        Relationship {
            source_id: NodeId::from(a),
            target_id: NodeId::from(b),
            kind,
            is_seam: false,
            metadata: Default::default(),
        }
    }

    #[test]
    fn callers_and_callees_are_one_hop_via_calls() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        store.upsert_node(node("a", "a"));
        store.upsert_node(node("b", "b"));
        store.upsert_node(node("c", "c"));
        store.upsert_relationship(rel("a", "b", RelationshipKind::Calls)).unwrap();
        store.upsert_relationship(rel("b", "c", RelationshipKind::Imports)).unwrap();
        let snapshot = store.snapshot();

        let callers = find_callers(&snapshot, &NodeId::from("b"));
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].node.id, NodeId::from("a"));

        let callees = find_callees(&snapshot, &NodeId::from("b"));
        assert!(callees.is_empty(), "imports edges must not count as callees");
    }

    #[test]
    fn references_cross_all_edge_types_and_dedup() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        store.upsert_node(node("a", "a"));
        store.upsert_node(node("b", "target"));
        store.upsert_relationship(rel("a", "b", RelationshipKind::Calls)).unwrap();
        store.upsert_relationship(rel("a", "b", RelationshipKind::References)).unwrap();
        let snapshot = store.snapshot();
        let refs = find_references(&snapshot, "target");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, NodeId::from("a"));
    }
}
