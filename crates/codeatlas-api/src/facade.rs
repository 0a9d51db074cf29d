use crate::dto::{CallChainDto, Category, PagedDto, Timed};
use crate::errors::ApiError;
use codeatlas_algo::{bfs, call_chain, categorize, dfs, find_callees, find_callers, find_references, seams, subgraph, NeighborEdge, SubgraphResult, TraversalResult};
use codeatlas_core::{page, EngineConfig, Node, NodeId, NodeKind, Relationship};
use codeatlas_ingest::IngestionCoordinator;
use codeatlas_store::{GraphStore, Stats};
use std::sync::Arc;
use std::time::Instant;

fn timed<T>(f: impl FnOnce() -> T) -> Timed<T> {
    let start = Instant::now();
    let data = f();
    Timed { data, execution_time_ms: start.elapsed().as_millis() as u64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    Bfs,
    Dfs,
}

/// Narrow read-only interface exposed to the HTTP layer. Every operation
/// snapshots the graph once under the store's read discipline and is a
/// pure function of that snapshot; `ForceReanalysis` is the one operation
/// with a side effect, delegated straight to C7.
pub struct QueryFacade {
    store: Arc<GraphStore>,
    ingestion: Arc<IngestionCoordinator>,
    config: EngineConfig,
}

impl QueryFacade {
    pub fn new(store: Arc<GraphStore>, ingestion: Arc<IngestionCoordinator>, config: EngineConfig) -> Self {
        Self { store, ingestion, config }
    }

    pub fn stats(&self) -> Timed<Stats> {
        timed(|| self.store.stats())
    }

    pub fn get_node(&self, id: &NodeId) -> Timed<Result<Node, ApiError>> {
        timed(|| self.store.get_node(id).ok_or_else(|| ApiError::not_found(format!("no node with id {id}"))))
    }

    pub fn search(
        &self,
        query: &str,
        language: Option<&str>,
        kind: Option<NodeKind>,
        offset: usize,
        limit: usize,
    ) -> Timed<PagedDto<Node>> {
        timed(|| {
            let (items, total) = self.store.search_by_name(query, language, kind, offset, limit);
            PagedDto::new(items, total, offset, limit)
        })
    }

    pub fn traverse(&self, start: &NodeId, mode: TraversalMode, max_depth: u32, include_seams: bool) -> Timed<TraversalResult> {
        let snapshot = self.store.snapshot();
        timed(|| match mode {
            TraversalMode::Bfs => bfs(&snapshot, start, max_depth, include_seams),
            TraversalMode::Dfs => dfs(&snapshot, start, max_depth, include_seams),
        })
    }

    pub fn call_chain(&self, start: &NodeId, target: Option<&NodeId>, follow_seams: bool, max_depth: u32) -> Timed<CallChainDto> {
        let snapshot = self.store.snapshot();
        timed(|| call_chain(&snapshot, start, target, follow_seams, max_depth).into())
    }

    pub fn callers(&self, node_id: &NodeId) -> Timed<Vec<NeighborEdge>> {
        let snapshot = self.store.snapshot();
        timed(|| find_callers(&snapshot, node_id))
    }

    pub fn callees(&self, node_id: &NodeId) -> Timed<Vec<NeighborEdge>> {
        let snapshot = self.store.snapshot();
        timed(|| find_callees(&snapshot, node_id))
    }

    pub fn references(&self, symbol: &str) -> Timed<Vec<Node>> {
        let snapshot = self.store.snapshot();
        timed(|| find_references(&snapshot, symbol))
    }

    pub fn categorize(&self, category: Category, offset: usize, limit: usize) -> Timed<PagedDto<NodeId>> {
        let snapshot = self.store.snapshot();
        let hub_threshold = self.config.hub_threshold_h;
        timed(move || {
            let categories = categorize(&snapshot, hub_threshold);
            let ids = match category {
                Category::EntryPoints => categories.entry_points,
                Category::Hubs => categories.hubs,
                Category::Leaves => categories.leaves,
            };
            let (items, total) = page(ids, offset, limit);
            PagedDto::new(items, total, offset, limit)
        })
    }

    pub fn seams(&self, offset: usize, limit: usize) -> Timed<PagedDto<Relationship>> {
        let snapshot = self.store.snapshot();
        timed(move || {
            let (items, total) = seams(&snapshot, offset, limit);
            PagedDto::new(items, total, offset, limit)
        })
    }

    pub fn subgraph(&self, node_id: &NodeId, depth: u32, limit: usize) -> Timed<SubgraphResult> {
        let snapshot = self.store.snapshot();
        timed(|| subgraph(&snapshot, node_id, depth, limit))
    }

    /// Delegates to C7: triggers ingestion against the current workspace
    /// and returns synchronously once the new batch begins.
    pub fn force_reanalysis(&self) -> Timed<Result<(), ApiError>> {
        timed(|| self.ingestion.force_reanalysis().map_err(ApiError::from))
    }
}
