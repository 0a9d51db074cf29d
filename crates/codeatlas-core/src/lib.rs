pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod paging;

pub use config::EngineConfig;
pub use error::CoreError;
pub use id::NodeId;
pub use model::{Metadata, Node, NodeKind, Relationship, RelationshipKind};
pub use paging::page;
