use thiserror::Error;

/// Error kinds raised by `GraphStore` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `UpsertRelationship` referenced an endpoint that is not present in
    /// the store. No event is emitted and the store is left unchanged.
    #[error("missing_endpoint: {0}")]
    MissingEndpoint(String),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::MissingEndpoint(_) => "missing_endpoint",
        }
    }
}
