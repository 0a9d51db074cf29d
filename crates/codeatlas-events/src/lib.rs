pub mod event;
pub mod journal;
pub mod sink;

pub use event::{Event, EventDraft, EventKind};
pub use journal::{Journal, JournalConfig, JournalError};
pub use sink::{EventSink, NullSink};

use std::sync::Arc;

/// Ties the journal (C4) to the fan-out sink (C5) so a single call both
/// persists and broadcasts a mutation: (a) assign id, (b) append to
/// journal, (c) hand to the sink via non-blocking enqueue. Journal append
/// never fails the caller; a saturated fan-out queue is the sink's problem
/// to isolate.
pub struct Publisher {
    journal: Journal,
    sink: Arc<dyn EventSink>,
}

impl Publisher {
    pub fn new(journal_config: JournalConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            journal: Journal::new(journal_config),
            sink,
        }
    }

    /// Publish a single draft. Appends to the journal first so the event is
    /// durable even if the fan-out sink drops it under backpressure.
    pub fn publish(&self, draft: EventDraft) -> Event {
        let event = self.journal.append(draft);
        self.sink.offer(&event);
        event
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);
    impl EventSink for CountingSink {
        fn offer(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn publish_appends_and_offers_exactly_once() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let publisher = Publisher::new(JournalConfig::default(), sink.clone());
        let draft = EventDraft::new(EventKind::NodeAdded, "node", "n1", json!({}));
        let event = publisher.publish(draft);
        assert_eq!(event.event_id, 1);
        assert_eq!(sink.0.load(Ordering::Relaxed), 1);
        assert_eq!(publisher.journal().latest_event_id(), 1);
    }
}
