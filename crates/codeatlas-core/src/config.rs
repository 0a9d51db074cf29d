use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every configuration option the engine recognizes, with the documented
/// defaults. Deserializable from JSON (CLI config file) or built up field by
/// field by the server's `Args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Degree threshold for hub categorization.
    pub hub_threshold_h: u32,
    /// Max events kept in the CDC journal.
    pub journal_retention_events: usize,
    /// Bounded outbound queue capacity per broadcast subscriber.
    pub subscriber_queue_capacity: usize,
    /// Heartbeat cadence for idle sessions.
    pub heartbeat_seconds: u64,
    /// Idle timeout before a session is closed.
    pub idle_timeout_seconds: u64,
    /// Per-batch ingestion deadline before rollback.
    pub batch_deadline_seconds: u64,
    /// Minimum spacing between `analysis_progress` events within one batch.
    pub progress_rate_limit_ms: u64,
    /// Root of the workspace being indexed (informational; parsing itself
    /// is performed by the external parser service).
    pub workspace_root: PathBuf,
    /// Glob patterns forwarded to the external parser to exclude paths.
    pub ignore_patterns: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hub_threshold_h: 10,
            journal_retention_events: 100_000,
            subscriber_queue_capacity: 1024,
            heartbeat_seconds: 30,
            idle_timeout_seconds: 60,
            batch_deadline_seconds: 300,
            progress_rate_limit_ms: 100,
            workspace_root: PathBuf::from("."),
            ignore_patterns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.hub_threshold_h, 10);
        assert_eq!(cfg.journal_retention_events, 100_000);
        assert_eq!(cfg.subscriber_queue_capacity, 1024);
        assert_eq!(cfg.heartbeat_seconds, 30);
        assert_eq!(cfg.idle_timeout_seconds, 60);
        assert_eq!(cfg.batch_deadline_seconds, 300);
        assert_eq!(cfg.progress_rate_limit_ms, 100);
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hub_threshold_h, cfg.hub_threshold_h);
    }
}
