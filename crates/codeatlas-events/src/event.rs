use serde::{Deserialize, Serialize};

/// The nine event kinds the journal and broadcast hub carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NodeAdded,
    NodeUpdated,
    NodeRemoved,
    RelationshipAdded,
    RelationshipRemoved,
    AnalysisStarted,
    AnalysisProgress,
    AnalysisCompleted,
    AnalysisFailed,
}

/// A single CDC record. `event_id` is assigned by the journal at publish
/// time and is monotonically increasing and local to one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
}

/// An event before it has been assigned an id/timestamp by the journal.
pub struct EventDraft {
    pub kind: EventKind,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
}

impl EventDraft {
    pub fn new(
        kind: EventKind,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            data,
        }
    }
}
