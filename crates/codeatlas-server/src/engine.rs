use codeatlas_api::QueryFacade;
use codeatlas_broadcast::{Hub, HubConfig};
use codeatlas_core::EngineConfig;
use codeatlas_events::{JournalConfig, Publisher};
use codeatlas_ingest::{IngestionCoordinator, NullParserClient, ParserClient};
use codeatlas_store::GraphStore;
use std::sync::Arc;

/// The process-wide engine instance: owns the graph store, journal/
/// publisher, broadcast hub, and ingestion coordinator, and wires them
/// together the way `Publisher`'s constructor expects (journal + sink
/// supplied up front, so the hub must exist before the store does).
pub struct Engine {
    pub config: EngineConfig,
    pub store: Arc<GraphStore>,
    pub publisher: Arc<Publisher>,
    pub hub: Arc<Hub>,
    pub ingestion: Arc<IngestionCoordinator>,
    pub facade: Arc<QueryFacade>,
}

impl Engine {
    /// Builds every component and signals readiness once the hub is
    /// accepting subscribers. Never waits on any subscriber's catch-up
    /// loop — that runs per-connection, inside the session task the `/ws`
    /// handler spawns.
    pub fn start(config: EngineConfig, parser_client: Arc<dyn ParserClient>) -> Arc<Self> {
        let hub = Arc::new(Hub::new(HubConfig { queue_capacity: config.subscriber_queue_capacity }));
        let journal_config = JournalConfig { max_events: config.journal_retention_events };
        let publisher = Arc::new(Publisher::new(journal_config, hub.clone()));
        let store = Arc::new(GraphStore::new(publisher.clone()));
        let ingestion = Arc::new(IngestionCoordinator::new(store.clone(), publisher.clone(), &config, parser_client));
        let facade = Arc::new(QueryFacade::new(store.clone(), ingestion.clone(), config.clone()));

        tracing::info!("engine started, accepting subscribers");
        Arc::new(Self { config, store, publisher, hub, ingestion, facade })
    }

    pub fn start_with_null_parser(config: EngineConfig) -> Arc<Self> {
        Self::start(config, Arc::new(NullParserClient))
    }

    /// Drains subscribers and stops accepting new mutations on shutdown.
    pub fn shutdown(&self) {
        tracing::info!("engine shutting down, draining subscribers");
        self.hub.shutdown();
    }

    pub fn journal(&self) -> &codeatlas_events::Journal {
        self.publisher.journal()
    }
}

/// Used only by tests that want an engine with no CDC fan-out at all.
#[cfg(test)]
pub fn engine_with_null_sink(config: EngineConfig) -> Arc<Engine> {
    let publisher = Arc::new(Publisher::new(
        JournalConfig { max_events: config.journal_retention_events },
        Arc::new(codeatlas_events::NullSink),
    ));
    let store = Arc::new(GraphStore::new(publisher.clone()));
    let ingestion = Arc::new(IngestionCoordinator::new(
        store.clone(),
        publisher.clone(),
        &config,
        Arc::new(NullParserClient),
    ));
    let facade = Arc::new(QueryFacade::new(store.clone(), ingestion.clone(), config.clone()));
    Arc::new(Engine {
        config,
        store,
        publisher,
        hub: Arc::new(Hub::new(HubConfig::default())),
        ingestion,
        facade,
    })
}
