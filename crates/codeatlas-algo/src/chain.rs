use codeatlas_core::{NodeId, RelationshipKind};
use codeatlas_store::GraphSnapshot;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallChainResult {
    Path(Vec<NodeId>),
    NoPath,
}

fn is_terminal_sink(snapshot: &GraphSnapshot, id: &NodeId) -> bool {
    !snapshot
        .outgoing(id)
        .iter()
        .any(|rel| rel.kind == RelationshipKind::Calls)
}

/// Shortest path over `calls` edges from `start` to `target` (or, when
/// `target` is `None`, to the nearest terminal sink / leaf), implemented as
/// a BFS that explores each node's outgoing edges in ascending target-id
/// order so the first path discovered to any node is also the
/// lexicographically smallest shortest path.
pub fn call_chain(
    snapshot: &GraphSnapshot,
    start: &NodeId,
    target: Option<&NodeId>,
    follow_seams: bool,
    max_depth: u32,
) -> CallChainResult {
    if !snapshot.contains(start) {
        return CallChainResult::NoPath;
    }

    let reached = |id: &NodeId| match target {
        Some(t) => id == t,
        None => is_terminal_sink(snapshot, id),
    };

    if reached(start) {
        return CallChainResult::Path(vec![start.clone()]);
    }

    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut visited: HashSet<NodeId> = HashSet::from([start.clone()]);
    let mut queue: VecDeque<(NodeId, u32)> = VecDeque::from([(start.clone(), 0)]);

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let mut callees: Vec<NodeId> = snapshot
            .outgoing(&current)
            .iter()
            .filter(|rel| rel.kind == RelationshipKind::Calls)
            .filter(|rel| follow_seams || !rel.is_seam)
            .map(|rel| rel.target_id.clone())
            .collect();
        callees.sort();
        callees.dedup();

        for next in callees {
            if !visited.insert(next.clone()) {
                continue;
            }
            parent.insert(next.clone(), current.clone());
            if reached(&next) {
                let mut path = vec![next.clone()];
                let mut cursor = next;
                while let Some(p) = parent.get(&cursor) {
                    path.push(p.clone());
                    cursor = p.clone();
                }
                path.reverse();
                return CallChainResult::Path(path);
            }
            queue.push_back((next, depth + 1));
        }
    }

    CallChainResult::NoPath
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeatlas_core::{Node, NodeKind, Relationship};
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
    fn shortest_path_tie_broken_lexicographically() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        for id in ["n1", "n2", "n3", "n4", "n5"] {
            store.upsert_node(node(id));
        }
        for (a, b) in [("n1", "n2"), ("n1", "n3"), ("n3", "n4"), ("n2", "n4"), ("n4", "n5")] {
            store.upsert_relationship(rel(a, b)).unwrap();
        }
        let snapshot = store.snapshot();
        let result = call_chain(&snapshot, &NodeId::from("n1"), Some(&NodeId::from("n5")), true, 10);
        assert_eq!(
            result,
            CallChainResult::Path(vec!["n1", "n2", "n4", "n5"].into_iter().map(NodeId::from).collect())
        );
    }

    #[test]
    fn no_path_when_unreachable() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        store.upsert_node(node("a"));
        store.upsert_node(node("b"));
        let snapshot = store.snapshot();
        let result = call_chain(&snapshot, &NodeId::from("a"), Some(&NodeId::from("b")), true, 10);
        assert_eq!(result, CallChainResult::NoPath);
    }

    #[test]
    fn finds_nearest_leaf_without_explicit_target() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        store.upsert_node(node("a"));
        store.upsert_node(node("leaf"));
        store.upsert_relationship(rel("a", "leaf")).unwrap();
        let snapshot = store.snapshot();
        let result = call_chain(&snapshot, &NodeId::from("a"), None, true, 10);
        assert_eq!(result, CallChainResult::Path(vec![NodeId::from("a"), NodeId::from("leaf")]));
    }
}
