use thiserror::Error;

/// Error kinds surfaced by the core value types. Library crates downstream
/// (`codeatlas-store`, `codeatlas-ingest`, ...) wrap these rather than
/// inventing parallel variants, so a caller can match on one vocabulary
/// end-to-end.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid_identifier: {0}")]
    InvalidIdentifier(String),
}

impl CoreError {
    /// The stable machine-readable kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::InvalidIdentifier(_) => "invalid_identifier",
        }
    }
}
