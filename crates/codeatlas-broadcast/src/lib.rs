//! Broadcast hub (C5): the subscriber registry, per-client bounded queues,
//! and backpressure isolation.

use codeatlas_events::{Event, EventKind, EventSink, Journal, JournalError};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Bounded outbound queue capacity per subscriber (`subscriberQueueCapacity`).
    pub queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { queue_capacity: 1024 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberLifecycle {
    Connecting,
    Live,
    Draining,
    Closed,
}

/// A message handed to the session endpoint (C6) over a subscriber's
/// outbound queue. Distinct from `Event` because `lag_exceeded` is a
/// control frame on the wire, not a journaled CDC record.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    Event(Event),
    LagExceeded,
}

struct SubscriberState {
    filter: RwLock<Option<HashSet<EventKind>>>,
    sender: mpsc::Sender<BroadcastMessage>,
    last_delivered: AtomicU64,
    lifecycle: RwLock<SubscriberLifecycle>,
}

impl SubscriberState {
    fn admits(&self, kind: EventKind) -> bool {
        match &*self.filter.read() {
            Some(types) => types.contains(&kind),
            None => true,
        }
    }
}

pub struct Subscription {
    pub id: String,
    /// Journaled events with `event_id > last_seen_id` (or a single
    /// `LagExceeded`), computed once at subscribe time. Not pushed through
    /// the bounded live queue: the caller drains this in order, awaiting
    /// each send, before reading from `receiver`, so a catch-up slice
    /// longer than `queue_capacity` is never silently truncated.
    pub catch_up: Vec<BroadcastMessage>,
    pub receiver: mpsc::Receiver<BroadcastMessage>,
}

/// Registry of active subscribers. Each owns its outbound queue; only
/// `Hub::offer` (the fan-out path) enqueues, only the session endpoint
/// dequeues.
pub struct Hub {
    config: HubConfig,
    subscribers: RwLock<HashMap<String, Arc<SubscriberState>>>,
    fanout_dropped: AtomicU64,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            subscribers: RwLock::new(HashMap::new()),
            fanout_dropped: AtomicU64::new(0),
        }
    }

    /// Registers `id` and computes the catch-up slice for `event_id >
    /// last_seen_id`, then transitions to `Live`. The caller is responsible
    /// for delivering `Subscription::catch_up` in order — awaiting each send
    /// — before reading from `receiver`; catch-up never goes through the
    /// bounded live queue, so it can't be truncated by `queue_capacity`. Run
    /// this inside the per-connection task the session endpoint spawns,
    /// never inline during engine startup — `Hub::new`/readiness never wait
    /// on it.
    pub fn subscribe(
        &self,
        id: String,
        filter: Option<HashSet<EventKind>>,
        last_seen_id: u64,
        journal: &Journal,
    ) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.config.queue_capacity);
        let state = Arc::new(SubscriberState {
            filter: RwLock::new(filter),
            sender,
            last_delivered: AtomicU64::new(last_seen_id),
            lifecycle: RwLock::new(SubscriberLifecycle::Connecting),
        });
        self.subscribers.write().insert(id.clone(), state.clone());

        let catch_up = match journal.from(last_seen_id) {
            Ok(events) => {
                let mut messages = Vec::with_capacity(events.len());
                for event in events {
                    state.last_delivered.store(event.event_id, Ordering::SeqCst);
                    if state.admits(event.kind) {
                        messages.push(BroadcastMessage::Event(event));
                    }
                }
                messages
            }
            Err(JournalError::LagExceeded) => {
                tracing::warn!(subscriber = %id, "lag_exceeded during catch-up");
                vec![BroadcastMessage::LagExceeded]
            }
        };

        *state.lifecycle.write() = SubscriberLifecycle::Live;
        Subscription { id, catch_up, receiver }
    }

    pub fn update_filter(&self, id: &str, filter: Option<HashSet<EventKind>>) {
        if let Some(state) = self.subscribers.read().get(id) {
            *state.filter.write() = filter;
        }
    }

    /// Releases the queue and removes the subscriber. No further events are
    /// buffered for it.
    pub fn unsubscribe(&self, id: &str) {
        if let Some(state) = self.subscribers.write().remove(id) {
            *state.lifecycle.write() = SubscriberLifecycle::Closed;
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Drains every subscriber on shutdown. Dropping the sender half closes
    /// each receiver, so the owning session task's next `recv` returns `None`
    /// and it can wind down its own `draining -> closed` transition.
    pub fn shutdown(&self) {
        let mut subscribers = self.subscribers.write();
        for state in subscribers.values() {
            *state.lifecycle.write() = SubscriberLifecycle::Closed;
        }
        subscribers.clear();
    }

    pub fn fanout_dropped_count(&self) -> u64 {
        self.fanout_dropped.load(Ordering::Relaxed)
    }
}

impl EventSink for Hub {
    /// Non-blocking fan-out. A full queue transitions that subscriber to
    /// `Draining` and counts a `fanout_dropped`; it never holds up delivery
    /// to any other subscriber or the publisher.
    fn offer(&self, event: &Event) {
        let subscribers = self.subscribers.read();
        for state in subscribers.values() {
            if *state.lifecycle.read() != SubscriberLifecycle::Live {
                continue;
            }
            if !state.admits(event.kind) {
                continue;
            }
            match state.sender.try_send(BroadcastMessage::Event(event.clone())) {
                Ok(()) => {
                    state.last_delivered.store(event.event_id, Ordering::SeqCst);
                }
                Err(TrySendError::Full(_)) => {
                    *state.lifecycle.write() = SubscriberLifecycle::Draining;
                    self.fanout_dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(event_id = event.event_id, "subscriber queue saturated, draining");
                }
                Err(TrySendError::Closed(_)) => {
                    *state.lifecycle.write() = SubscriberLifecycle::Closed;
                }
            }
        }
    }
}
