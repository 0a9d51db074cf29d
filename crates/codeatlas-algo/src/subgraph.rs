use codeatlas_core::{Node, NodeId, Relationship};
use codeatlas_store::GraphSnapshot;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// The induced subgraph of a bounded BFS neighbourhood around `nodeId`
/// `truncated` is set once `limit` nodes have been
/// collected, mirroring the same cap used by `Stats`-style list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubgraphResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Relationship>,
    pub truncated: bool,
}

pub fn subgraph(snapshot: &GraphSnapshot, start: &NodeId, depth: u32, limit: usize) -> SubgraphResult {
    let mut result = SubgraphResult::default();
    let Some(start_node) = snapshot.get_node(start) else {
        return result;
    };

    let mut visited: HashSet<NodeId> = HashSet::from([start.clone()]);
    let mut included: Vec<NodeId> = vec![start.clone()];
    result.nodes.push(start_node.clone());
    let mut queue: VecDeque<(NodeId, u32)> = VecDeque::from([(start.clone(), 0)]);

    'bfs: while let Some((current, d)) = queue.pop_front() {
        if d >= depth {
            continue;
        }
        for rel in snapshot.outgoing(&current) {
            if visited.contains(&rel.target_id) {
                continue;
            }
            if result.nodes.len() >= limit {
                result.truncated = true;
                break 'bfs;
            }
            visited.insert(rel.target_id.clone());
            included.push(rel.target_id.clone());
            if let Some(node) = snapshot.get_node(&rel.target_id) {
                result.nodes.push(node.clone());
            }
            queue.push_back((rel.target_id.clone(), d + 1));
        }
    }

    let included_set: HashSet<&NodeId> = included.iter().collect();
    for id in &included {
        for rel in snapshot.outgoing(id) {
            if included_set.contains(&rel.target_id) {
                result.edges.push(rel.clone());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeatlas_core::{NodeKind, RelationshipKind};
    use codeatlas_events::{JournalConfig, NullSink, Publisher};
    use codeatlas_store::GraphStore;
    use std::sync::Arc;

    fn node(id: &str) -> Node {
        Node {
            id: NodeId::from(id),
            name: id.to_string(),
            kind: NodeKind::Function,
            language: "python".into(),
            file: "f.py".into(),
            line: 1,
            end_line: 2,
            complexity: 1,
            metadata: Default::default(),
        }
    }

    fn rel(a: &str, b: &str) -> Relationship {
        Relationship {
            source_id: NodeId::from(a),
            target_id: NodeId::from(b),
            kind: RelationshipKind::Calls,
            is_seam: false,
            metadata: Default::default(),
        }
    }

    #[test]
    fn subgraph_truncates_at_limit() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        for id in ["a", "b", "c", "d"] {
            store.upsert_node(node(id));
        }
        for (a, b) in [("a", "b"), ("a", "c"), ("a", "d")] {
            store.upsert_relationship(rel(a, b)).unwrap();
        }
        let snapshot = store.snapshot();
        let result = subgraph(&snapshot, &NodeId::from("a"), 2, 2);
        assert_eq!(result.nodes.len(), 2);
        assert!(result.truncated);
    }

    #[test]
    fn subgraph_includes_induced_edges_only() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        for id in ["a", "b", "c"] {
            store.upsert_node(node(id));
        }
        store.upsert_relationship(rel("a", "b")).unwrap();
        store.upsert_relationship(rel("b", "c")).unwrap();
        let snapshot = store.snapshot();
        let result = subgraph(&snapshot, &NodeId::from("a"), 1, 10);
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges.len(), 1);
    }
}
