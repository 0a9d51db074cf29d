use codeatlas_ingest::IngestError;
use codeatlas_store::StoreError;
use serde::Serialize;

/// The `{error: {kind, message, details?}}` error shape, with kinds drawn
/// from a fixed vocabulary. Deliberately framework-agnostic: the HTTP
/// status mapping lives in `http_status`, read by whichever transport wraps
/// this facade (`codeatlas-server`'s axum handlers).
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: kind.into(), message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message)
    }

    /// The HTTP status this kind maps to: 4xx for caller errors like
    /// `invalid_identifier`/`not_found`, 5xx for `internal`/
    /// `deadline_exceeded` and friends.
    pub fn http_status(&self) -> u16 {
        match self.kind.as_str() {
            "invalid_identifier" | "missing_endpoint" => 400,
            "not_found" => 404,
            "deadline_exceeded" => 504,
            "parser_error" | "batch_rolled_back" => 502,
            "cancelled" => 499,
            _ => 500,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
