use codeatlas_algo::CallChainResult;
use codeatlas_core::NodeId;
use serde::Serialize;

/// Every list-returning query's envelope: the page plus the total matching
/// count, so a caller can paginate without a second round trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedDto<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> PagedDto<T> {
    pub fn new(items: Vec<T>, total: usize, offset: usize, limit: usize) -> Self {
        Self { items, total, offset, limit }
    }
}

/// Wraps every query-facade response with the `executionTimeMs` every
/// response is expected to carry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timed<T> {
    pub data: T,
    pub execution_time_ms: u64,
}

/// `CallChainResult` reshaped for the wire: `found` flags whether a path
/// exists instead of relying on a tagged-enum client decode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallChainDto {
    pub found: bool,
    pub path: Vec<NodeId>,
}

impl From<CallChainResult> for CallChainDto {
    fn from(result: CallChainResult) -> Self {
        match result {
            CallChainResult::Path(path) => Self { found: true, path },
            CallChainResult::NoPath => Self { found: false, path: Vec::new() },
        }
    }
}

/// The three category names addressable via `/api/graph/categories/{..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    EntryPoints,
    Hubs,
    Leaves,
}

impl Category {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "entryPoints" => Some(Category::EntryPoints),
            "hubs" => Some(Category::Hubs),
            "leaves" => Some(Category::Leaves),
            _ => None,
        }
    }
}
