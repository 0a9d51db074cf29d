use crate::error::{ApiResult, HttpError};
use crate::Engine;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use codeatlas_api::{ApiError, Category, PagedDto, Timed, TraversalMode};
use codeatlas_core::{Node, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn router() -> Router<Arc<Engine>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/graph/stats", get(stats))
        .route("/api/graph/nodes/{id}", get(get_node))
        .route("/api/graph/nodes/search", get(search))
        .route("/api/graph/traverse", post(traverse))
        .route("/api/graph/call-chain/{start_id}", get(call_chain))
        .route("/api/graph/query/{operation}", get(one_hop_query))
        .route("/api/graph/categories/{category}", get(categories))
        .route("/api/graph/seams", get(seams))
        .route("/api/graph/subgraph", post(subgraph))
        .route("/api/graph/admin/reanalyze", post(reanalyze))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    /// No Redis dependency in this engine; always `true`. Kept for parity
    /// with the documented health schema.
    redis_reachable: bool,
    graph_ready: bool,
}

async fn health(State(_engine): State<Arc<Engine>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        redis_reachable: true,
        graph_ready: true,
    })
}

async fn stats(State(engine): State<Arc<Engine>>) -> Json<Timed<codeatlas_store::Stats>> {
    Json(engine.facade.stats())
}

async fn get_node(State(engine): State<Arc<Engine>>, Path(id): Path<String>) -> ApiResult<Timed<Node>> {
    let node_id = NodeId::from(id);
    let Timed { data, execution_time_ms } = engine.facade.get_node(&node_id);
    let node = data.map_err(HttpError)?;
    Ok(Json(Timed { data: node, execution_time_ms }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    q: String,
    language: Option<String>,
    kind: Option<String>,
    #[serde(default)]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

fn parse_kind(raw: &Option<String>) -> Result<Option<NodeKind>, HttpError> {
    raw.as_deref()
        .map(|value| match value {
            "function" => Ok(NodeKind::Function),
            "method" => Ok(NodeKind::Method),
            "class" => Ok(NodeKind::Class),
            "module" => Ok(NodeKind::Module),
            "import" => Ok(NodeKind::Import),
            "variable" => Ok(NodeKind::Variable),
            "other" => Ok(NodeKind::Other),
            other => Err(HttpError(ApiError::new("invalid_identifier", format!("unknown kind {other:?}")))),
        })
        .transpose()
}

async fn search(State(engine): State<Arc<Engine>>, Query(params): Query<SearchParams>) -> ApiResult<Timed<PagedDto<Node>>> {
    let kind = parse_kind(&params.kind)?;
    Ok(Json(engine.facade.search(&params.q, params.language.as_deref(), kind, params.offset, params.limit)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraverseRequest {
    start_id: String,
    kind: String,
    max_depth: u32,
    #[serde(default)]
    include_seams: bool,
}

async fn traverse(State(engine): State<Arc<Engine>>, Json(req): Json<TraverseRequest>) -> ApiResult<Timed<codeatlas_algo::TraversalResult>> {
    let mode = match req.kind.as_str() {
        "bfs" => TraversalMode::Bfs,
        "dfs" => TraversalMode::Dfs,
        other => return Err(HttpError(ApiError::new("invalid_identifier", format!("unknown traversal kind {other:?}")))),
    };
    let start = NodeId::from(req.start_id);
    Ok(Json(engine.facade.traverse(&start, mode, req.max_depth, req.include_seams)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallChainParams {
    target_id: Option<String>,
    #[serde(default = "default_true")]
    follow_seams: bool,
    #[serde(default = "default_max_depth")]
    max_depth: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    50
}

async fn call_chain(
    State(engine): State<Arc<Engine>>,
    Path(start_id): Path<String>,
    Query(params): Query<CallChainParams>,
) -> Json<Timed<codeatlas_api::CallChainDto>> {
    let start = NodeId::from(start_id);
    let target = params.target_id.map(NodeId::from);
    Json(engine.facade.call_chain(&start, target.as_ref(), params.follow_seams, params.max_depth))
}

#[derive(Debug, Deserialize)]
struct SymbolParam {
    symbol: String,
}

async fn one_hop_query(
    State(engine): State<Arc<Engine>>,
    Path(operation): Path<String>,
    Query(params): Query<SymbolParam>,
) -> ApiResult<serde_json::Value> {
    let value = match operation.as_str() {
        "callers" => {
            let result = engine.facade.callers(&NodeId::from(params.symbol));
            serde_json::to_value(result).unwrap_or_default()
        }
        "callees" => {
            let result = engine.facade.callees(&NodeId::from(params.symbol));
            serde_json::to_value(result).unwrap_or_default()
        }
        "references" => {
            let result = engine.facade.references(&params.symbol);
            serde_json::to_value(result).unwrap_or_default()
        }
        other => return Err(HttpError(ApiError::new("not_found", format!("unknown query operation {other:?}")))),
    };
    Ok(Json(value))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    #[serde(default)]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

async fn categories(
    State(engine): State<Arc<Engine>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Timed<PagedDto<NodeId>>> {
    let category = Category::parse(&category)
        .ok_or_else(|| HttpError(ApiError::new("not_found", format!("unknown category {category:?}"))))?;
    Ok(Json(engine.facade.categorize(category, params.offset, params.limit)))
}

async fn seams(
    State(engine): State<Arc<Engine>>,
    Query(params): Query<PageParams>,
) -> Json<Timed<PagedDto<codeatlas_core::Relationship>>> {
    Json(engine.facade.seams(params.offset, params.limit))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubgraphRequest {
    node_id: String,
    depth: u32,
    limit: usize,
}

async fn subgraph(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<SubgraphRequest>,
) -> Json<Timed<codeatlas_algo::SubgraphResult>> {
    let node_id = NodeId::from(req.node_id);
    Json(engine.facade.subgraph(&node_id, req.depth, req.limit))
}

async fn reanalyze(State(engine): State<Arc<Engine>>) -> Result<StatusCode, HttpError> {
    let Timed { data, .. } = engine.facade.force_reanalysis();
    data.map_err(HttpError)?;
    Ok(StatusCode::ACCEPTED)
}
