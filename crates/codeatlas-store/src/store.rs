use crate::error::StoreError;
use crate::snapshot::GraphSnapshot;
use codeatlas_core::{Node, NodeId, NodeKind, Relationship, RelationshipKind};
use codeatlas_events::{EventDraft, EventKind, Publisher};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipOutcome {
    Added,
    Unchanged,
}

/// Histograms and totals for the current graph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_nodes: usize,
    pub total_relationships: usize,
    pub languages: HashMap<String, usize>,
    pub kinds: HashMap<String, usize>,
}

/// Opaque point-in-time copy of the store's full state, used by the
/// ingestion coordinator's rollback path. Deliberately not `Clone`-cheap:
/// rollback is the exceptional path, not the hot one.
pub struct Checkpoint(Inner);

#[derive(Clone, Default)]
struct Inner {
    nodes: HashMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    outgoing: HashMap<NodeId, Vec<Relationship>>,
    incoming: HashMap<NodeId, Vec<Relationship>>,
    rel_keys: HashSet<(NodeId, NodeId, RelationshipKind)>,
    total_relationships: usize,
    name_index: HashMap<String, BTreeSet<NodeId>>,
    file_index: HashMap<String, BTreeSet<NodeId>>,
    language_histogram: HashMap<String, usize>,
    kind_histogram: HashMap<NodeKind, usize>,
}

impl Inner {
    fn index_node(&mut self, node: &Node) {
        self.name_index
            .entry(node.name.clone())
            .or_default()
            .insert(node.id.clone());
        self.file_index
            .entry(node.file.clone())
            .or_default()
            .insert(node.id.clone());
        *self.language_histogram.entry(node.language.clone()).or_insert(0) += 1;
        *self.kind_histogram.entry(node.kind).or_insert(0) += 1;
    }

    fn deindex_node(&mut self, node: &Node) {
        if let Some(set) = self.name_index.get_mut(&node.name) {
            set.remove(&node.id);
            if set.is_empty() {
                self.name_index.remove(&node.name);
            }
        }
        if let Some(set) = self.file_index.get_mut(&node.file) {
            set.remove(&node.id);
            if set.is_empty() {
                self.file_index.remove(&node.file);
            }
        }
        if let Some(count) = self.language_histogram.get_mut(&node.language) {
            *count -= 1;
            if *count == 0 {
                self.language_histogram.remove(&node.language);
            }
        }
        if let Some(count) = self.kind_histogram.get_mut(&node.kind) {
            *count -= 1;
            if *count == 0 {
                self.kind_histogram.remove(&node.kind);
            }
        }
    }
}

/// In-memory code graph store (C2). Readers-writer discipline: one writer
/// at a time, many concurrent readers, protected by a single `parking_lot`
/// lock. Every observable mutation publishes exactly one CDC event through
/// the shared `Publisher`; an unchanged upsert publishes nothing.
pub struct GraphStore {
    inner: RwLock<Inner>,
    publisher: Arc<Publisher>,
}

impl GraphStore {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            publisher,
        }
    }

    pub fn upsert_node(&self, node: Node) -> UpsertOutcome {
        let (outcome, draft) = {
            let mut inner = self.inner.write();
            match inner.nodes.get(&node.id) {
                Some(existing) if existing.same_attributes(&node) => return UpsertOutcome::Unchanged,
                Some(existing) => {
                    let existing = existing.clone();
                    inner.deindex_node(&existing);
                    inner.index_node(&node);
                    let data = serde_json::to_value(&node).unwrap_or_default();
                    let draft = EventDraft::new(EventKind::NodeUpdated, "node", node.id.as_str(), data);
                    inner.nodes.insert(node.id.clone(), node);
                    (UpsertOutcome::Updated, draft)
                }
                None => {
                    inner.index_node(&node);
                    inner.node_order.push(node.id.clone());
                    let data = serde_json::to_value(&node).unwrap_or_default();
                    let draft = EventDraft::new(EventKind::NodeAdded, "node", node.id.as_str(), data);
                    inner.nodes.insert(node.id.clone(), node);
                    (UpsertOutcome::Added, draft)
                }
            }
        };
        self.publisher.publish(draft);
        outcome
    }

    /// Removes a node and every incident relationship, emitting
    /// `relationship_removed` for each edge before the single
    /// `node_removed`. Returns the number of edges removed; a no-op (absent
    /// node) returns 0 without publishing.
    pub fn remove_node(&self, id: &NodeId) -> usize {
        let (removed_count, edge_drafts, node_draft) = {
            let mut inner = self.inner.write();
            let Some(node) = inner.nodes.get(id).cloned() else {
                return 0;
            };

            let mut incident: Vec<Relationship> = Vec::new();
            incident.extend(inner.outgoing.get(id).cloned().unwrap_or_default());
            incident.extend(
                inner
                    .incoming
                    .get(id)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|r| r.source_id != *id),
            );

            let mut edge_drafts = Vec::with_capacity(incident.len());
            for rel in &incident {
                let key = rel.key();
                inner.rel_keys.remove(&key);
                if let Some(v) = inner.outgoing.get_mut(&rel.source_id) {
                    v.retain(|r| r.key() != key);
                }
                if let Some(v) = inner.incoming.get_mut(&rel.target_id) {
                    v.retain(|r| r.key() != key);
                }
                inner.total_relationships = inner.total_relationships.saturating_sub(1);
                let entity_id = format!("{}->{}:{}", rel.source_id, rel.target_id, rel.kind.as_str());
                let data = serde_json::to_value(rel).unwrap_or_default();
                edge_drafts.push(EventDraft::new(EventKind::RelationshipRemoved, "relationship", entity_id, data));
            }

            inner.outgoing.remove(id);
            inner.incoming.remove(id);
            inner.deindex_node(&node);
            inner.nodes.remove(id);
            inner.node_order.retain(|n| n != id);

            let data = serde_json::to_value(&node).unwrap_or_default();
            let node_draft = EventDraft::new(EventKind::NodeRemoved, "node", id.as_str(), data);
            (incident.len(), edge_drafts, node_draft)
        };

        for draft in edge_drafts {
            self.publisher.publish(draft);
        }
        self.publisher.publish(node_draft);
        removed_count
    }

    /// `isSeam` is always derived from the endpoints' languages, never
    /// taken from the caller; `type == seam` forces it to `true` regardless.
    pub fn upsert_relationship(&self, mut rel: Relationship) -> Result<RelationshipOutcome, StoreError> {
        let draft = {
            let mut inner = self.inner.write();
            let Some(source) = inner.nodes.get(&rel.source_id) else {
                return Err(StoreError::MissingEndpoint(rel.source_id.to_string()));
            };
            let Some(target) = inner.nodes.get(&rel.target_id) else {
                return Err(StoreError::MissingEndpoint(rel.target_id.to_string()));
            };
            rel.is_seam = rel.kind == RelationshipKind::Seam || source.language != target.language;

            let key = rel.key();
            if inner.rel_keys.contains(&key) {
                return Ok(RelationshipOutcome::Unchanged);
            }

            inner.rel_keys.insert(key);
            inner.outgoing.entry(rel.source_id.clone()).or_default().push(rel.clone());
            inner.incoming.entry(rel.target_id.clone()).or_default().push(rel.clone());
            inner.total_relationships += 1;

            let entity_id = format!("{}->{}:{}", rel.source_id, rel.target_id, rel.kind.as_str());
            let data = serde_json::to_value(&rel).unwrap_or_default();
            EventDraft::new(EventKind::RelationshipAdded, "relationship", entity_id, data)
        };
        self.publisher.publish(draft);
        Ok(RelationshipOutcome::Added)
    }

    pub fn remove_relationship(&self, source_id: &NodeId, target_id: &NodeId, kind: RelationshipKind) -> bool {
        let draft = {
            let mut inner = self.inner.write();
            let key = (source_id.clone(), target_id.clone(), kind);
            if !inner.rel_keys.remove(&key) {
                return false;
            }
            if let Some(v) = inner.outgoing.get_mut(source_id) {
                v.retain(|r| r.key() != key);
            }
            if let Some(v) = inner.incoming.get_mut(target_id) {
                v.retain(|r| r.key() != key);
            }
            inner.total_relationships = inner.total_relationships.saturating_sub(1);
            let entity_id = format!("{source_id}->{target_id}:{}", kind.as_str());
            let data = serde_json::json!({
                "sourceId": source_id.as_str(),
                "targetId": target_id.as_str(),
                "type": kind.as_str(),
            });
            EventDraft::new(EventKind::RelationshipRemoved, "relationship", entity_id, data)
        };
        self.publisher.publish(draft);
        true
    }

    pub fn get_node(&self, id: &NodeId) -> Option<Node> {
        self.inner.read().nodes.get(id).cloned()
    }

    pub fn outgoing_edges(&self, id: &NodeId) -> Vec<Relationship> {
        self.inner.read().outgoing.get(id).cloned().unwrap_or_default()
    }

    pub fn incoming_edges(&self, id: &NodeId) -> Vec<Relationship> {
        self.inner.read().incoming.get(id).cloned().unwrap_or_default()
    }

    /// Ranked name search: exact match > case-insensitive exact > prefix >
    /// substring, ties broken by ascending `file` then `line`.
    pub fn search_by_name(
        &self,
        query: &str,
        language: Option<&str>,
        kind: Option<NodeKind>,
        offset: usize,
        limit: usize,
    ) -> (Vec<Node>, usize) {
        let inner = self.inner.read();
        let query_lower = query.to_lowercase();
        let mut scored: Vec<(u8, Node)> = Vec::new();
        for id in &inner.node_order {
            let Some(node) = inner.nodes.get(id) else { continue };
            if let Some(lang) = language
                && node.language != lang
            {
                continue;
            }
            if let Some(k) = kind
                && node.kind != k
            {
                continue;
            }
            let name_lower = node.name.to_lowercase();
            let tier = if node.name == query {
                0
            } else if name_lower == query_lower {
                1
            } else if name_lower.starts_with(&query_lower) {
                2
            } else if name_lower.contains(&query_lower) {
                3
            } else {
                continue;
            };
            scored.push((tier, node.clone()));
        }
        scored.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.file.cmp(&b.1.file))
                .then_with(|| a.1.line.cmp(&b.1.line))
        });
        let total = scored.len();
        let page = scored.into_iter().skip(offset).take(limit).map(|(_, n)| n).collect();
        (page, total)
    }

    pub fn stats(&self) -> Stats {
        let inner = self.inner.read();
        Stats {
            total_nodes: inner.nodes.len(),
            total_relationships: inner.total_relationships,
            languages: inner.language_histogram.clone(),
            kinds: inner
                .kind_histogram
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
        }
    }

    /// Copies the state C3/C8 traversals need into an immutable snapshot
    /// while holding the read lock, then releases it.
    pub fn snapshot(&self) -> GraphSnapshot {
        let inner = self.inner.read();
        GraphSnapshot {
            nodes: inner.nodes.clone(),
            node_order: inner.node_order.clone(),
            outgoing: inner.outgoing.clone(),
            incoming: inner.incoming.clone(),
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.inner.read().clone())
    }

    /// Restores state captured by `checkpoint`, for the ingestion
    /// coordinator's rollback path. Restoring does not itself publish any
    /// CDC events: the graph ends up exactly as it was before the failed
    /// batch began, with no new observable mutation to report.
    pub fn restore(&self, checkpoint: Checkpoint) {
        *self.inner.write() = checkpoint.0;
    }
}


#[cfg(test)]
mod invariant_properties {
    use super::*;
    use codeatlas_events::{JournalConfig, NullSink, Publisher};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        UpsertNode(usize),
        UpsertRelationship(usize, usize),
        RemoveNode(usize),
    }

    /// A handful of id slots, so relationship ops frequently land on nodes
    /// that already exist rather than always hitting `missing_endpoint`.
    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..8).prop_map(Op::UpsertNode),
            (0usize..8, 0usize..8).prop_map(|(a, b)| Op::UpsertRelationship(a, b)),
            (0usize..8).prop_map(Op::RemoveNode),
        ]
    }

    fn node_for_slot(slot: usize) -> Node {
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

    fn store() -> GraphStore {
        GraphStore::new(Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink))))
    }

    proptest! {
        /// For all sequences of valid mutations, after each mutation every
        /// relationship's endpoints exist in the store.
        #[test]
        fn relationship_endpoints_always_exist(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let store = store();
            for op in ops {
                match op {
                    Op::UpsertNode(slot) => {
                        store.upsert_node(node_for_slot(slot));
                    }
                    Op::UpsertRelationship(a, b) => {
                        let _ = store.upsert_relationship(Relationship {
                            source_id: NodeId::from(format!("function:f{a}.py:n{a}:1")),
                            target_id: NodeId::from(format!("function:f{b}.py:n{b}:1")),
                            kind: RelationshipKind::Calls,
                            is_seam: false,
                            metadata: Default::default(),
                        });
                    }
                    Op::RemoveNode(slot) => {
                        store.remove_node(&NodeId::from(format!("function:f{slot}.py:n{slot}:1")));
                    }
                }

                let inner = store.inner.read();
                for rels in inner.outgoing.values() {
                    for rel in rels {
                        prop_assert!(inner.nodes.contains_key(&rel.source_id));
                        prop_assert!(inner.nodes.contains_key(&rel.target_id));
                    }
                }
            }
        }

        /// `Upsert(n)` followed by an identical `Upsert(n)` emits exactly
        /// one `node_added` and nothing further.
        #[test]
        fn repeated_identical_upsert_is_unchanged(slot in 0usize..8, complexity in 0u32..50) {
            let store = store();
            let mut n = node_for_slot(slot);
            n.complexity = complexity;
            prop_assert_eq!(store.upsert_node(n.clone()), UpsertOutcome::Added);
            prop_assert_eq!(store.upsert_node(n.clone()), UpsertOutcome::Unchanged);
            prop_assert_eq!(store.upsert_node(n), UpsertOutcome::Unchanged);
        }
    }
}
