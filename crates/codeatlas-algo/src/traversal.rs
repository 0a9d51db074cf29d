use codeatlas_core::NodeId;
use codeatlas_store::GraphSnapshot;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Nodes grouped by depth from the traversal root, depth `0` being the
/// root itself. Empty (not an error) when the start id is absent from the
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    pub levels: Vec<Vec<NodeId>>,
}

/// Breadth-first walk over outgoing edges, `maxDepth` inclusive. Cycles are
/// broken by a visited set; seam edges are skipped entirely when
/// `include_seams` is false.
pub fn bfs(snapshot: &GraphSnapshot, start: &NodeId, max_depth: u32, include_seams: bool) -> TraversalResult {
    if !snapshot.contains(start) {
        return TraversalResult::default();
    }

    let mut levels: Vec<Vec<NodeId>> = vec![vec![start.clone()]];
    let mut visited: HashSet<NodeId> = HashSet::from([start.clone()]);
    let mut queue: VecDeque<(NodeId, u32)> = VecDeque::from([(start.clone(), 0)]);

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for rel in snapshot.outgoing(&current) {
            if !include_seams && rel.is_seam {
                continue;
            }
            if visited.insert(rel.target_id.clone()) {
                let next_depth = depth + 1;
                if levels.len() <= next_depth as usize {
                    levels.resize_with(next_depth as usize + 1, Vec::new);
                }
                levels[next_depth as usize].push(rel.target_id.clone());
                queue.push_back((rel.target_id.clone(), next_depth));
            }
        }
    }

    TraversalResult { levels }
}

/// Depth-first pre-order walk with the same edge/cycle/seam semantics as
/// [`bfs`], grouping nodes by discovery depth rather than traversal order.
pub fn dfs(snapshot: &GraphSnapshot, start: &NodeId, max_depth: u32, include_seams: bool) -> TraversalResult {
    if !snapshot.contains(start) {
        return TraversalResult::default();
    }

    let mut levels: Vec<Vec<NodeId>> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::from([start.clone()]);
    let mut stack: Vec<(NodeId, u32)> = vec![(start.clone(), 0)];

    fn record(levels: &mut Vec<Vec<NodeId>>, depth: u32, id: NodeId) {
        if levels.len() <= depth as usize {
            levels.resize_with(depth as usize + 1, Vec::new);
        }
        levels[depth as usize].push(id);
    }
    record(&mut levels, 0, start.clone());

    while let Some((current, depth)) = stack.pop() {
        if depth >= max_depth {
            continue;
        }
        // Push in reverse so the first outgoing edge is visited first,
        // preserving insertion order under the stack's LIFO discipline.
        for rel in snapshot.outgoing(&current).iter().rev() {
            if !include_seams && rel.is_seam {
                continue;
            }
            if visited.insert(rel.target_id.clone()) {
                record(&mut levels, depth + 1, rel.target_id.clone());
                stack.push((rel.target_id.clone(), depth + 1));
            }
        }
    }

    TraversalResult { levels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeatlas_core::{Node, NodeKind, Relationship, RelationshipKind};
    use codeatlas_events::{JournalConfig, NullSink, Publisher};
    use codeatlas_store::GraphStore;
    use std::sync::Arc;

    fn node(id: &str, lang: &str) -> Node {
        Node {
            id: NodeId::from(id),
            name: id.to_string(),
            kind: NodeKind::Function,
            language: lang.to_string(),
            file: "f".into(),
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

    fn store_with_seam() -> GraphStore {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        store.upsert_node(node("a", "python"));
        store.upsert_node(node("b", "typescript"));
        store.upsert_relationship(rel("a", "b")).unwrap();
        store
    }

    #[test]
    fn bfs_skips_seams_unless_included() {
        let store = store_with_seam();
        let snapshot = store.snapshot();
        let without = bfs(&snapshot, &NodeId::from("a"), 1, false);
        assert_eq!(without.levels, vec![vec![NodeId::from("a")]]);
        let with = bfs(&snapshot, &NodeId::from("a"), 1, true);
        assert_eq!(with.levels, vec![vec![NodeId::from("a")], vec![NodeId::from("b")]]);
    }

    #[test]
    fn bfs_absent_start_is_empty_not_error() {
        let store = store_with_seam();
        let snapshot = store.snapshot();
        let result = bfs(&snapshot, &NodeId::from("missing"), 5, true);
        assert_eq!(result, TraversalResult::default());
    }

    #[test]
    fn dfs_breaks_cycles() {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        store.upsert_node(node("a", "python"));
        store.upsert_node(node("b", "python"));
        store.upsert_relationship(rel("a", "b")).unwrap();
        store.upsert_relationship(rel("b", "a")).unwrap();
        let snapshot = store.snapshot();
        let result = dfs(&snapshot, &NodeId::from("a"), 10, true);
        assert_eq!(result.levels, vec![vec![NodeId::from("a")], vec![NodeId::from("b")]]);
    }
}

#[cfg(test)]
mod determinism_properties {
    use super::*;
    use codeatlas_core::{Node, NodeKind, Relationship, RelationshipKind};
    use codeatlas_events::{JournalConfig, NullSink, Publisher};
    use codeatlas_store::GraphStore;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn node(slot: usize) -> Node {
        Node {
            id: NodeId::from(format!("function:f{slot}.py:n{slot}:1")),
            name: format!("n{slot}"),
            kind: NodeKind::Function,
            language: "python".into(),
            file: format!("f{slot}.py"),
            line: 1,
            end_line: 2,
            complexity: 1,
            metadata: Default::default(),
        }
    }

    fn build(edges: &[(usize, usize)]) -> GraphStore {
        let store = GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))));
        for slot in 0..8 {
            store.upsert_node(node(slot));
        }
        for &(a, b) in edges {
            store
                .upsert_relationship(Relationship {
                    source_id: NodeId::from(format!("function:f{a}.py:n{a}:1")),
                    target_id: NodeId::from(format!("function:f{b}.py:n{b}:1")),
                    kind: RelationshipKind::Calls,
                    is_seam: false,
                    metadata: Default::default(),
                })
                .unwrap();
        }
        store
    }

    proptest! {
        /// Two identical sequences of mutations against empty stores yield
        /// byte-identical `BFS`/`DFS` results for the same inputs.
        #[test]
        fn bfs_and_dfs_are_deterministic_given_the_same_mutations(
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)
        ) {
            let store_a = build(&edges);
            let store_b = build(&edges);
            let snap_a = store_a.snapshot();
            let snap_b = store_b.snapshot();

            let start = NodeId::from("function:f0.py:n0:1");
            prop_assert_eq!(bfs(&snap_a, &start, 5, true), bfs(&snap_b, &start, 5, true));
            prop_assert_eq!(dfs(&snap_a, &start, 5, true), dfs(&snap_b, &start, 5, true));
        }
    }
}
