use thiserror::Error;

/// Ingestion failure kinds. Both are surfaced as a single `analysis_failed`
/// event; `kind()` is the machine-readable label callers match on (the HTTP
/// layer maps neither to 4xx — both are 5xx).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("parser_error: {0}")]
    ParserError(String),
    #[error("deadline_exceeded")]
    DeadlineExceeded,
}

impl IngestError {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::ParserError(_) => "parser_error",
            IngestError::DeadlineExceeded => "deadline_exceeded",
        }
    }
}
