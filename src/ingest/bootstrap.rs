//! Target-polygon bootstrap against the configuration service.
//!
//! Once per camera at startup, a REQ/REP exchange fetches the scoring
//! polygon and frame size. The service may come up after us, so failure
//! is retried on a fixed 60 s backoff, forever — the camera keeps
//! tracking in the meantime and simply reports target-less verdicts.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::geometry::Point;
use crate::domain::target::TargetPolygon;
use crate::registry::CameraRegistry;
use crate::{BowError, Result};

use super::ipc_endpoint;

/// Send/receive timeout for one bootstrap attempt.
const REQUEST_TIMEOUT_MS: i32 = 3000;
/// Pause between failed attempts.
const RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Reply from the configuration service.
#[derive(Debug, Deserialize)]
pub struct TargetInfo {
    /// Scoring polygon vertices in frame-pixel space
    pub target: Vec<Point>,
    /// Source frame dimensions (width, height)
    pub frame_size: [u32; 2],
}

/// Spawn the bootstrap thread for one camera.
pub fn spawn_target_bootstrap(registry: Arc<CameraRegistry>, cam_id: String, channel: String) {
    let thread_name = format!("target-{channel}");
    let spawned = thread::Builder::new().name(thread_name.clone()).spawn(move || loop {
        match fetch_target(&channel) {
            Ok(info) => {
                match apply(&registry, &cam_id, info) {
                    Ok(()) => info!(cam_id = %cam_id, "target polygon installed"),
                    Err(e) => error!(cam_id = %cam_id, error = %e, "target install failed"),
                }
                return;
            }
            Err(e) => {
                warn!(
                    cam_id = %cam_id,
                    error = %e,
                    retry_secs = RETRY_BACKOFF.as_secs(),
                    "target bootstrap failed, will retry"
                );
                thread::sleep(RETRY_BACKOFF);
            }
        }
    });
    if let Err(e) = spawned {
        error!(thread = %thread_name, error = %e, "failed to spawn bootstrap thread");
    }
}

/// One REQ/REP exchange. A fresh socket per attempt: a REQ socket that
/// timed out mid-exchange is stuck in the wrong protocol state.
fn fetch_target(channel: &str) -> Result<TargetInfo> {
    let context = zmq::Context::new();
    let socket = context
        .socket(zmq::REQ)
        .map_err(|e| BowError::Transport(format!("REQ socket: {e}")))?;

    socket
        .set_linger(0)
        .and_then(|_| socket.set_rcvtimeo(REQUEST_TIMEOUT_MS))
        .and_then(|_| socket.set_sndtimeo(REQUEST_TIMEOUT_MS))
        .map_err(|e| BowError::Transport(format!("socket options: {e}")))?;

    let endpoint = ipc_endpoint(channel);
    socket
        .connect(&endpoint)
        .map_err(|e| BowError::Transport(format!("connect {endpoint}: {e}")))?;

    socket
        .send(r#"{"type": "target_info"}"#.as_bytes(), 0)
        .map_err(|e| BowError::Transport(format!("request: {e}")))?;

    let reply = socket
        .recv_bytes(0)
        .map_err(|e| BowError::Transport(format!("reply: {e}")))?;

    serde_json::from_slice(&reply).map_err(|e| BowError::Decode(format!("target info: {e}")))
}

/// Install a fetched target into the camera's tracking state.
pub(crate) fn apply(registry: &CameraRegistry, cam_id: &str, info: TargetInfo) -> Result<()> {
    let entry = registry
        .get(cam_id)
        .ok_or_else(|| BowError::UnknownCamera(cam_id.to_string()))?;

    let mut tracking = entry.tracking.lock();
    tracking.set_target(TargetPolygon::new(info.target));
    tracking.set_frame_size((info.frame_size[0], info.frame_size[1]));
    Ok(())
}
