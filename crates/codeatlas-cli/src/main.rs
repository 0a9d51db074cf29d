mod feed;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use clap::{Args as ClapArgs, Parser, Subcommand};
use codeatlas_core::EngineConfig;
use codeatlas_ingest::NullParserClient;
use codeatlas_server::{routes, ws, Engine};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Front end for driving the engine from a parser-feed file instead of a
/// live parser connection (the feed groups messages by `batchId`); this
/// crate is the thin CLI plumbing around the engine, not one of the core
/// three subsystems.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply every batch in a parser-feed file to a fresh engine instance
    /// and print the resulting stats. Does not serve HTTP/WS.
    Ingest(IngestArgs),
    /// Start the HTTP/WS engine, optionally pre-loading a parser-feed file
    /// before accepting requests.
    Serve(ServeArgs),
}

#[derive(Debug, ClapArgs)]
struct IngestArgs {
    /// Path to a parser-feed file: one JSON `ParserMessage` per line.
    feed: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, ClapArgs)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 7979)]
    port: u16,

    /// Optional parser-feed file applied before the server starts
    /// accepting connections.
    #[arg(long)]
    feed: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, ClapArgs)]
struct ConfigArgs {
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

impl From<ConfigArgs> for EngineConfig {
    fn from(args: ConfigArgs) -> Self {
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

/// Reads `path`, groups its messages by batch id, and applies each batch in
/// the order the batch ids were first seen, one batch at a time; a feed
/// file is just a pre-recorded stand-in for the live stream.
fn ingest_feed(engine: &Engine, path: &PathBuf) -> Result<()> {
    let batches = feed::read_feed(path)?;
    info!(batches = batches.len(), feed = %path.display(), "applying parser feed");
    for (batch_id, messages) in batches {
        let summary = engine
            .ingestion
            .apply_batch(&batch_id, messages)
            .with_context(|| format!("applying batch {batch_id}"))?;
        info!(
            batch_id = %summary.batch_id,
            nodes = summary.nodes_applied,
            relationships = summary.relationships_applied,
            deletions = summary.deletions_applied,
            "batch applied"
        );
    }
    Ok(())
}

fn run_ingest(args: IngestArgs) -> Result<()> {
    let config = EngineConfig::from(args.config);
    let engine = Engine::start_with_null_parser(config);
    ingest_feed(&engine, &args.feed)?;
    let stats = engine.store.stats();
    println!(
        "{} nodes, {} relationships across {} language(s)",
        stats.total_nodes,
        stats.total_relationships,
        stats.languages.len()
    );
    engine.shutdown();
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let config = EngineConfig::from(args.config);
    let engine = Engine::start(config, Arc::new(NullParserClient));

    if let Some(feed_path) = &args.feed {
        ingest_feed(&engine, feed_path)?;
    }

    let app = Router::new()
        .merge(routes::router())
        .route("/ws/events", get(ws::events))
        .route("/ws/events/filtered", get(ws::events_filtered))
        .with_state(engine.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    info!(%addr, "codeatlas-cli serving");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    engine.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Ingest(args) => run_ingest(args),
        Command::Serve(args) => {
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?
                .block_on(run_serve(args))
        }
    }
}
