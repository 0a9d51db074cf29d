pub mod error;
pub mod snapshot;
pub mod store;

pub use error::StoreError;
pub use snapshot::GraphSnapshot;
pub use store::{Checkpoint, GraphStore, RelationshipOutcome, Stats, UpsertOutcome};
