pub mod client;
pub mod coordinator;
pub mod error;
pub mod message;

pub use client::{NullParserClient, ParserClient};
pub use coordinator::{BatchSummary, IngestConfig, IngestionCoordinator};
pub use error::IngestError;
pub use message::{DeleteTarget, EdgeTriple, ParserMessage, ParserMessageKind};
