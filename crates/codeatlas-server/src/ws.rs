//! The duplex session endpoint (C6): `/ws/events` and
//! `/ws/events/filtered`. One task per connection runs the state machine
//! `handshaking -> catchup -> live -> draining -> closed`, forwarding
//! `BroadcastMessage`s from the hub's per-subscriber queue to the socket and
//! decoding client control frames the other way.

use crate::Engine;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use codeatlas_broadcast::BroadcastMessage;
use codeatlas_events::EventKind;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeParams {
    #[serde(default)]
    last_seen_id: u64,
    #[serde(default)]
    types: Option<Vec<String>>,
}

pub async fn events(
    State(engine): State<Arc<Engine>>,
    Query(params): Query<SubscribeParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(engine, socket, params))
}

pub async fn events_filtered(
    State(engine): State<Arc<Engine>>,
    Query(params): Query<SubscribeParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(engine, socket, params))
}

fn parse_kind(raw: &str) -> Option<EventKind> {
    match raw {
        "node_added" => Some(EventKind::NodeAdded),
        "node_updated" => Some(EventKind::NodeUpdated),
        "node_removed" => Some(EventKind::NodeRemoved),
        "relationship_added" => Some(EventKind::RelationshipAdded),
        "relationship_removed" => Some(EventKind::RelationshipRemoved),
        "analysis_started" => Some(EventKind::AnalysisStarted),
        "analysis_progress" => Some(EventKind::AnalysisProgress),
        "analysis_completed" => Some(EventKind::AnalysisCompleted),
        "analysis_failed" => Some(EventKind::AnalysisFailed),
        _ => None,
    }
}

fn filter_set(types: &Option<Vec<String>>) -> Option<HashSet<EventKind>> {
    let types = types.as_ref()?;
    Some(types.iter().filter_map(|t| parse_kind(t)).collect())
}

/// Drives handshake, catch-up, live fan-out, and drain for one connection.
/// Subscribes to the hub from inside this task (never at engine startup),
/// so a slow or never-connecting client cannot hold up `Engine::start`.
async fn session(engine: Arc<Engine>, mut socket: WebSocket, params: SubscribeParams) {
    let id = Uuid::new_v4().to_string();
    let filter = filter_set(&params.types);
    let mut subscription = engine.hub.subscribe(id.clone(), filter, params.last_seen_id, engine.journal());

    for message in subscription.catch_up.drain(..) {
        let sent = match message {
            BroadcastMessage::Event(event) => send_json(&mut socket, &event).await,
            BroadcastMessage::LagExceeded => send_control(&mut socket, "lag_exceeded", None).await,
        };
        if sent.is_err() {
            engine.hub.unsubscribe(&id);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    }

    let heartbeat_every = Duration::from_secs(engine.config.heartbeat_seconds);
    let idle_timeout = Duration::from_secs(engine.config.idle_timeout_seconds);
    let mut last_activity = Instant::now();

    'live: loop {
        tokio::select! {
            biased;

            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        if handle_client_frame(&engine, &id, &text).await.is_break() {
                            break 'live;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break 'live,
                    Some(Ok(_)) => last_activity = Instant::now(),
                    Some(Err(err)) => {
                        tracing::warn!(subscriber = %id, error = %err, "websocket read error");
                        break 'live;
                    }
                }
            }

            outgoing = subscription.receiver.recv() => {
                match outgoing {
                    Some(BroadcastMessage::Event(event)) => {
                        if send_json(&mut socket, &event).await.is_err() {
                            break 'live;
                        }
                    }
                    Some(BroadcastMessage::LagExceeded) => {
                        if send_control(&mut socket, "lag_exceeded", None).await.is_err() {
                            break 'live;
                        }
                    }
                    None => break 'live,
                }
            }

            _ = tokio::time::sleep(heartbeat_every) => {
                if send_control(&mut socket, "heartbeat", None).await.is_err() {
                    break 'live;
                }
                if last_activity.elapsed() > idle_timeout {
                    tracing::info!(subscriber = %id, "idle timeout, draining");
                    break 'live;
                }
            }
        }
    }

    drain(&mut socket, &mut subscription.receiver).await;
    engine.hub.unsubscribe(&id);
    let _ = socket.send(Message::Close(None)).await;
}

/// Best-effort delivery of whatever is already queued, bounded by the
/// session's hard drain deadline of 5 seconds.
async fn drain(socket: &mut WebSocket, receiver: &mut tokio::sync::mpsc::Receiver<BroadcastMessage>) {
    let deadline = tokio::time::sleep(DRAIN_DEADLINE);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            message = receiver.recv() => {
                match message {
                    Some(BroadcastMessage::Event(event)) => {
                        if send_json(socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Some(BroadcastMessage::LagExceeded) => {
                        if send_control(socket, "lag_exceeded", None).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

enum ControlFlow {
    Continue,
    Break,
}

impl ControlFlow {
    fn is_break(&self) -> bool {
        matches!(self, ControlFlow::Break)
    }
}

async fn handle_client_frame(engine: &Arc<Engine>, id: &str, text: &str) -> ControlFlow {
    let Ok(frame) = serde_json::from_str::<serde_json::Value>(text) else {
        return ControlFlow::Continue;
    };
    match frame.get("control").and_then(|v| v.as_str()) {
        Some("ping") => ControlFlow::Continue,
        Some("ack") => ControlFlow::Continue,
        Some("subscribe_filter") => {
            let types: Option<Vec<String>> = frame
                .get("types")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
            engine.hub.update_filter(id, filter_set(&types));
            ControlFlow::Continue
        }
        _ => ControlFlow::Continue,
    }
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), axum::Error> {
    let text = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    tokio::time::timeout(DRAIN_DEADLINE, socket.send(Message::Text(text.into())))
        .await
        .unwrap_or(Err(axum::Error::new(std::io::Error::from(std::io::ErrorKind::TimedOut))))
}

async fn send_control(socket: &mut WebSocket, control: &str, extra: Option<serde_json::Value>) -> Result<(), axum::Error> {
    let mut frame = json!({ "control": control });
    if let Some(extra) = extra {
        if let (Some(frame_obj), Some(extra_obj)) = (frame.as_object_mut(), extra.as_object()) {
            frame_obj.extend(extra_obj.clone());
        }
    }
    send_json(socket, &frame).await
}
