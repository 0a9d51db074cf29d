//! Traversal and algorithm library (C3): BFS/DFS, shortest call chains,
//! one-hop caller/callee/reference lookups, entry-point/hub/leaf
//! categorization, cross-language seam enumeration and bounded subgraph
//! extraction — all deterministic over a single `GraphSnapshot`.

mod categorize;
mod chain;
mod references;
mod seams;
mod subgraph;
mod traversal;

pub use categorize::{categorize, Categories};
pub use chain::{call_chain, CallChainResult};
pub use references::{find_callees, find_callers, find_references, NeighborEdge};
pub use seams::seams;
pub use subgraph::{subgraph, SubgraphResult};
pub use traversal::{bfs, dfs, TraversalResult};
