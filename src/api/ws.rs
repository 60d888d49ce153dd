//! Live viewer sessions and hit broadcasting.
//!
//! Viewers connect to `/ws/hit/:cam_id`. Each connection registers a
//! [`ViewerSession`]; once the viewer reports its video size it receives
//! the target polygon and, per decided shot, a hit event — both mapped
//! into its own render space. Send failures drop that viewer only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::domain::events::HitEnvelope;
use crate::domain::geometry;
use crate::registry::CameraRegistry;

use super::dto::{ViewerCommand, ViewerMessage};
use super::state::AppState;

/// One connected viewer.
struct ViewerSession {
    tx: mpsc::UnboundedSender<ViewerMessage>,
    /// `None` until the viewer reports its video element size
    video_size: Option<(u32, u32)>,
}

/// Per-camera set of connected viewer sessions.
#[derive(Default)]
pub struct LiveFeed {
    sessions: RwLock<HashMap<String, HashMap<u64, ViewerSession>>>,
    next_viewer_id: AtomicU64,
}

impl LiveFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer; returns its id and the push channel.
    pub fn connect(&self, cam_id: &str) -> (u64, mpsc::UnboundedReceiver<ViewerMessage>) {
        let viewer_id = self.next_viewer_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .write()
            .entry(cam_id.to_string())
            .or_default()
            .insert(viewer_id, ViewerSession { tx, video_size: None });
        (viewer_id, rx)
    }

    /// Remove a viewer (disconnect or send failure). Idempotent.
    pub fn disconnect(&self, cam_id: &str, viewer_id: u64) {
        let mut sessions = self.sessions.write();
        if let Some(viewers) = sessions.get_mut(cam_id) {
            viewers.remove(&viewer_id);
            if viewers.is_empty() {
                sessions.remove(cam_id);
            }
        }
    }

    /// Record a viewer's reported video size.
    pub fn set_video_size(&self, cam_id: &str, viewer_id: u64, size: (u32, u32)) {
        if let Some(session) = self
            .sessions
            .write()
            .get_mut(cam_id)
            .and_then(|viewers| viewers.get_mut(&viewer_id))
        {
            session.video_size = Some(size);
        }
    }

    /// Connected viewers for one camera.
    pub fn viewer_count(&self, cam_id: &str) -> usize {
        self.sessions.read().get(cam_id).map_or(0, |v| v.len())
    }

    /// Fan a hit verdict out to the camera's viewers, each in its own
    /// render space. Viewers without a known video size are skipped;
    /// viewers whose channel is gone are dropped from the session set.
    pub fn broadcast(&self, registry: &CameraRegistry, envelope: &HitEnvelope) {
        let frame_size = match registry.get(&envelope.cam_id) {
            Some(entry) => entry.tracking.lock().frame_size(),
            None => {
                warn!(cam_id = %envelope.cam_id, "broadcast for unregistered camera");
                return;
            }
        };

        let mut dead = Vec::new();
        {
            let sessions = self.sessions.read();
            let viewers = match sessions.get(&envelope.cam_id) {
                Some(v) if !v.is_empty() => v,
                _ => return,
            };

            for (&viewer_id, session) in viewers {
                let (frame, video) = match (frame_size, session.video_size) {
                    (Some(f), Some(v)) => (f, v),
                    // Either size still unknown: not an error, skip.
                    _ => continue,
                };
                let tip = geometry::to_render_coords(envelope.result.point, frame, video);
                let msg = ViewerMessage::Hit { tip, inside: envelope.result.inside };
                if session.tx.send(msg).is_err() {
                    dead.push(viewer_id);
                }
            }
        }

        for viewer_id in dead {
            warn!(cam_id = %envelope.cam_id, viewer_id, "dropping unreachable viewer");
            self.disconnect(&envelope.cam_id, viewer_id);
        }
    }
}

/// Consume the detector's hit bus and fan out to viewers until the
/// sender side goes away.
pub async fn run_feed(
    feed: Arc<LiveFeed>,
    registry: Arc<CameraRegistry>,
    mut hits: broadcast::Receiver<HitEnvelope>,
) {
    loop {
        match hits.recv().await {
            Ok(envelope) => feed.broadcast(&registry, &envelope),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged = n, "live feed lagged, verdicts dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// WebSocket upgrade for `/ws/hit/:cam_id`.
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(cam_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, cam_id))
}

/// Drive one viewer connection.
async fn handle_socket(socket: WebSocket, state: AppState, cam_id: String) {
    let (viewer_id, mut push_rx) = state.feed().connect(&cam_id);
    info!(cam_id = %cam_id, viewer_id, viewers = state.feed().viewer_count(&cam_id),
          "viewer connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            push = push_rx.recv() => {
                let Some(msg) = push else { break };
                let Ok(json) = serde_json::to_string(&msg) else { continue };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_client_message(&state, &cam_id, viewer_id, &text) {
                            let Ok(json) = serde_json::to_string(&reply) else { continue };
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong: nothing to do
                    Some(Err(e)) => {
                        debug!(cam_id = %cam_id, viewer_id, error = %e, "viewer socket error");
                        break;
                    }
                }
            }
        }
    }

    state.feed().disconnect(&cam_id, viewer_id);
    info!(cam_id = %cam_id, viewer_id, "viewer disconnected");
}

/// Handle one client message; may yield an immediate reply.
fn handle_client_message(
    state: &AppState,
    cam_id: &str,
    viewer_id: u64,
    text: &str,
) -> Option<ViewerMessage> {
    let command: ViewerCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(_) => {
            debug!(cam_id = %cam_id, viewer_id, "ignoring unrecognized viewer message");
            return None;
        }
    };

    match command {
        ViewerCommand::VideoSize { width, height } => {
            state.feed().set_video_size(cam_id, viewer_id, (width, height));

            let entry = match state.registry().get(cam_id) {
                Some(e) => e,
                None => {
                    warn!(cam_id = %cam_id, "video size for unregistered camera");
                    return None;
                }
            };
            let points = entry.tracking.lock().polygon_to_render(Some((width, height)));
            match points {
                Some(points) => Some(ViewerMessage::Polygon { points }),
                None => {
                    debug!(cam_id = %cam_id, "no polygon to send yet");
                    None
                }
            }
        }
    }
}
