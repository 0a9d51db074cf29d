use crate::client::ParserClient;
use crate::error::IngestError;
use crate::message::{DeleteTarget, ParserMessage, ParserMessageKind};
use codeatlas_core::EngineConfig;
use codeatlas_events::{EventDraft, EventKind, Publisher};
use codeatlas_store::GraphStore;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct IngestConfig {
    pub batch_deadline: Duration,
    pub progress_rate_limit: Duration,
}

impl From<&EngineConfig> for IngestConfig {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            batch_deadline: Duration::from_secs(cfg.batch_deadline_seconds),
            progress_rate_limit: Duration::from_millis(cfg.progress_rate_limit_ms),
        }
    }
}

/// Cumulative unit counts for one applied (or rolled back) batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub batch_id: String,
    pub nodes_applied: usize,
    pub relationships_applied: usize,
    pub deletions_applied: usize,
}

/// Bounded recency set backing the idempotent `analysis_started` tracking.
/// Capacity is generous: batch ids are short-lived, this only guards
/// against a retried `end`-less resend.
struct SeenBatches {
    order: VecDeque<String>,
    set: HashSet<String>,
    capacity: usize,
}

impl SeenBatches {
    fn new(capacity: usize) -> Self {
        Self { order: VecDeque::new(), set: HashSet::new(), capacity }
    }

    /// Returns `true` the first time `id` is seen.
    fn mark(&mut self, id: &str) -> bool {
        if !self.set.insert(id.to_string()) {
            return false;
        }
        self.order.push_back(id.to_string());
        if self.order.len() > self.capacity
            && let Some(evicted) = self.order.pop_front()
        {
            self.set.remove(&evicted);
        }
        true
    }
}

/// Applies parser-fed batches to the graph store in a fixed order, with
/// checkpoint/rollback on failure and rate-limited progress events. One
/// instance per engine.
pub struct IngestionCoordinator {
    store: Arc<GraphStore>,
    publisher: Arc<Publisher>,
    config: IngestConfig,
    workspace_root: PathBuf,
    parser_client: Arc<dyn ParserClient>,
    seen_batches: Mutex<SeenBatches>,
}

impl IngestionCoordinator {
    pub fn new(
        store: Arc<GraphStore>,
        publisher: Arc<Publisher>,
        engine_config: &EngineConfig,
        parser_client: Arc<dyn ParserClient>,
    ) -> Self {
        Self {
            store,
            publisher,
            config: IngestConfig::from(engine_config),
            workspace_root: engine_config.workspace_root.clone(),
            parser_client,
            seen_batches: Mutex::new(SeenBatches::new(1024)),
        }
    }

    /// Applies every message belonging to one batch: nodes, then
    /// relationships, then deletions (edge deletions before node deletions
    /// within that last group). On parser error or deadline overrun the
    /// store is restored to its pre-batch checkpoint and `analysis_failed`
    /// is emitted; otherwise `analysis_completed` carries the final counts.
    pub fn apply_batch(&self, batch_id: &str, messages: Vec<ParserMessage>) -> Result<BatchSummary, IngestError> {
        let start = Instant::now();
        if self.seen_batches.lock().mark(batch_id) {
            self.emit(EventKind::AnalysisStarted, batch_id, json!({ "batchId": batch_id }));
        }

        let checkpoint = self.store.checkpoint();

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut edge_deletions = Vec::new();
        let mut node_deletions = Vec::new();

        for message in messages {
            match message.kind {
                ParserMessageKind::Node(node) => nodes.push(node),
                ParserMessageKind::Edge(rel) => edges.push(rel),
                ParserMessageKind::Delete(DeleteTarget::Edge { triple }) => edge_deletions.push(triple),
                ParserMessageKind::Delete(DeleteTarget::Node { id }) => node_deletions.push(id),
                ParserMessageKind::Progress | ParserMessageKind::End => {}
                ParserMessageKind::Error(reason) => {
                    return self.fail(batch_id, checkpoint, IngestError::ParserError(reason));
                }
            }
        }

        let total_units = nodes.len() + edges.len() + edge_deletions.len() + node_deletions.len();
        let mut summary = BatchSummary { batch_id: batch_id.to_string(), ..Default::default() };
        let mut last_progress = Instant::now();

        for node in nodes {
            if start.elapsed() > self.config.batch_deadline {
                return self.fail(batch_id, checkpoint, IngestError::DeadlineExceeded);
            }
            self.store.upsert_node(node);
            summary.nodes_applied += 1;
            self.maybe_emit_progress(batch_id, &summary, total_units, &mut last_progress);
        }

        for rel in edges {
            if start.elapsed() > self.config.batch_deadline {
                return self.fail(batch_id, checkpoint, IngestError::DeadlineExceeded);
            }
            if let Err(err) = self.store.upsert_relationship(rel) {
                return self.fail(batch_id, checkpoint, IngestError::ParserError(err.to_string()));
            }
            summary.relationships_applied += 1;
            self.maybe_emit_progress(batch_id, &summary, total_units, &mut last_progress);
        }

        for triple in edge_deletions {
            if start.elapsed() > self.config.batch_deadline {
                return self.fail(batch_id, checkpoint, IngestError::DeadlineExceeded);
            }
            self.store.remove_relationship(&triple.source_id, &triple.target_id, triple.kind);
            summary.deletions_applied += 1;
            self.maybe_emit_progress(batch_id, &summary, total_units, &mut last_progress);
        }

        for id in node_deletions {
            if start.elapsed() > self.config.batch_deadline {
                return self.fail(batch_id, checkpoint, IngestError::DeadlineExceeded);
            }
            self.store.remove_node(&id);
            summary.deletions_applied += 1;
            self.maybe_emit_progress(batch_id, &summary, total_units, &mut last_progress);
        }

        self.emit(EventKind::AnalysisCompleted, batch_id, serde_json::to_value(&summary).unwrap_or_default());
        Ok(summary)
    }

    /// Delegates to the external parser's `trigger_reanalysis`. The new
    /// batch, once it arrives, goes through `apply_batch` like any other.
    pub fn force_reanalysis(&self) -> Result<(), IngestError> {
        self.parser_client.trigger_reanalysis(&self.workspace_root)
    }

    fn emit(&self, kind: EventKind, batch_id: &str, data: serde_json::Value) {
        self.publisher.publish(EventDraft::new(kind, "batch", batch_id, data));
    }

    fn maybe_emit_progress(&self, batch_id: &str, summary: &BatchSummary, total: usize, last: &mut Instant) {
        let applied = summary.nodes_applied + summary.relationships_applied + summary.deletions_applied;
        if last.elapsed() >= self.config.progress_rate_limit || applied == total {
            self.emit(
                EventKind::AnalysisProgress,
                batch_id,
                json!({ "applied": applied, "total": total }),
            );
            *last = Instant::now();
        }
    }

    fn fail(&self, batch_id: &str, checkpoint: codeatlas_store::Checkpoint, err: IngestError) -> Result<BatchSummary, IngestError> {
        self.store.restore(checkpoint);
        tracing::error!(batch_id, error = %err, "batch rolled back");
        self.emit(
            EventKind::AnalysisFailed,
            batch_id,
            json!({ "reason": err.to_string(), "kind": err.kind(), "rolledBack": true }),
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::NullParserClient;
    use crate::message::EdgeTriple;
    use codeatlas_core::{Node, NodeId, NodeKind, Relationship, RelationshipKind};
    use codeatlas_events::{JournalConfig, NullSink};

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

    fn coordinator() -> (IngestionCoordinator, Arc<GraphStore>) {
        let publisher = Arc::new(Publisher::new(JournalConfig::default(), Arc::new(NullSink)));
        let store = Arc::new(GraphStore::new(publisher.clone()));
        let coordinator = IngestionCoordinator::new(
            store.clone(),
            publisher,
            &EngineConfig::default(),
            Arc::new(NullParserClient),
        );
        (coordinator, store)
    }

    fn msg(batch_id: &str, kind: ParserMessageKind) -> ParserMessage {
        ParserMessage { batch_id: batch_id.to_string(), kind }
    }

    #[test]
    fn applies_nodes_then_edges_then_deletions() {
        let (coordinator, store) = coordinator();
        let messages = vec![
            msg("b1", ParserMessageKind::Node(node("a"))),
            msg("b1", ParserMessageKind::Node(node("b"))),
            msg("b1", ParserMessageKind::Edge(rel("a", "b"))),
            msg("b1", ParserMessageKind::End),
        ];
        let summary = coordinator.apply_batch("b1", messages).unwrap();
        assert_eq!(summary.nodes_applied, 2);
        assert_eq!(summary.relationships_applied, 1);
        assert_eq!(store.stats().total_nodes, 2);
    }

    #[test]
    fn parser_error_rolls_back_the_whole_batch() {
        let (coordinator, store) = coordinator();
        coordinator.apply_batch("b0", vec![msg("b0", ParserMessageKind::Node(node("pre")))]).unwrap();
        assert_eq!(store.stats().total_nodes, 1);

        let messages = vec![
            msg("b1", ParserMessageKind::Node(node("a"))),
            msg("b1", ParserMessageKind::Error("parser crashed".into())),
        ];
        let err = coordinator.apply_batch("b1", messages).unwrap_err();
        assert_eq!(err.kind(), "parser_error");
        assert_eq!(store.stats().total_nodes, 1, "batch must leave the graph exactly as before it began");
    }

    #[test]
    fn deletions_remove_edges_before_nodes() {
        let (coordinator, store) = coordinator();
        coordinator
            .apply_batch(
                "b0",
                vec![
                    msg("b0", ParserMessageKind::Node(node("a"))),
                    msg("b0", ParserMessageKind::Node(node("b"))),
                    msg("b0", ParserMessageKind::Edge(rel("a", "b"))),
                ],
            )
            .unwrap();

        let messages = vec![
            msg(
                "b1",
                ParserMessageKind::Delete(DeleteTarget::Node { id: NodeId::from("a") }),
            ),
            msg(
                "b1",
                ParserMessageKind::Delete(DeleteTarget::Edge {
                    triple: EdgeTriple {
                        source_id: NodeId::from("a"),
                        target_id: NodeId::from("b"),
                        kind: RelationshipKind::Calls,
                    },
                }),
            ),
        ];
        let summary = coordinator.apply_batch("b1", messages).unwrap();
        assert_eq!(summary.deletions_applied, 2);
        assert_eq!(store.stats().total_nodes, 1);
        assert_eq!(store.stats().total_relationships, 0);
    }

    #[test]
    fn analysis_started_is_idempotent_within_a_batch_id() {
        let (coordinator, _store) = coordinator();
        assert!(coordinator.seen_batches.lock().mark("b1"));
        assert!(!coordinator.seen_batches.lock().mark("b1"));
    }
}
