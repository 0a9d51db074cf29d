use crate::event::Event;

/// The fan-out side of the publish path. Implemented by the broadcast hub
/// (C5). `offer` must not block: a saturated per-subscriber queue is the
/// hub's problem to isolate, never the publisher's.
pub trait EventSink: Send + Sync {
    fn offer(&self, event: &Event);
}

/// No-op sink used before a hub is wired up, and in tests that only care
/// about journal behavior.
pub struct NullSink;

impl EventSink for NullSink {
    fn offer(&self, _event: &Event) {}
}
