use anyhow::Result;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use codeatlas_core::EngineConfig;
use codeatlas_server::routes;
use codeatlas_server::ws;
use codeatlas_server::Engine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 7979)]
    port: u16,

    #[arg(long, default_value = ".")]
    workspace_root: PathBuf,

    #[arg(long, default_value_t = 10)]
    hub_threshold_h: u32,

    #[arg(long, default_value_t = 100_000)]
    journal_retention_events: usize,

    #[arg(long, default_value_t = 1024)]
    subscriber_queue_capacity: usize,

    #[arg(long, default_value_t = 30)]
    heartbeat_seconds: u64,

    #[arg(long, default_value_t = 60)]
    idle_timeout_seconds: u64,

    #[arg(long, default_value_t = 300)]
    batch_deadline_seconds: u64,

    #[arg(long, default_value_t = 100)]
    progress_rate_limit_ms: u64,

    #[arg(long = "ignore", value_delimiter = ',')]
    ignore_patterns: Vec<String>,
}

impl From<Args> for EngineConfig {
    fn from(args: Args) -> Self {
        Self {
            hub_threshold_h: args.hub_threshold_h,
            journal_retention_events: args.journal_retention_events,
            subscriber_queue_capacity: args.subscriber_queue_capacity,
            heartbeat_seconds: args.heartbeat_seconds,
            idle_timeout_seconds: args.idle_timeout_seconds,
            batch_deadline_seconds: args.batch_deadline_seconds,
            progress_rate_limit_ms: args.progress_rate_limit_ms,
            workspace_root: args.workspace_root,
            ignore_patterns: args.ignore_patterns,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let config = EngineConfig::from(args);

    let engine = Engine::start_with_null_parser(config);

    let app = Router::new()
        .merge(routes::router())
        .route("/ws/events", get(ws::events))
        .route("/ws/events/filtered", get(ws::events_filtered))
        .with_state(engine.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    info!(%addr, "codeatlas-server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    engine.shutdown();
    Ok(())
}
