//! Per-camera detection subscriber loops.
//!
//! Each loop owns one ZeroMQ SUB socket, blocks on receive (a dead
//! source simply yields no events), and dispatches every decoded
//! message into the registry. Faults are strictly per-event: a decode
//! error or unknown camera drops that message and nothing else.

use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use crate::domain::events::DetectionEvent;
use crate::registry::CameraRegistry;
use crate::{BowError, Result};

use super::ipc_endpoint;

/// Spawn the subscriber thread for one camera channel.
///
/// Any failure — spawning the thread or connecting the socket — is
/// logged and leaves the camera unfed: degraded, never fatal.
pub fn spawn_subscriber(registry: Arc<CameraRegistry>, cam_id: String, channel: String) {
    let thread_name = format!("sub-{channel}");
    let spawned = thread::Builder::new().name(thread_name.clone()).spawn(move || {
        if let Err(e) = run_subscriber(&registry, &cam_id, &channel) {
            error!(cam_id = %cam_id, channel = %channel, error = %e, "subscriber terminated");
        }
    });
    if let Err(e) = spawned {
        error!(thread = %thread_name, error = %e, "failed to spawn subscriber thread");
    }
}

fn run_subscriber(registry: &CameraRegistry, cam_id: &str, channel: &str) -> Result<()> {
    let context = zmq::Context::new();
    let socket = context
        .socket(zmq::SUB)
        .map_err(|e| BowError::Transport(format!("SUB socket: {e}")))?;

    let endpoint = ipc_endpoint(channel);
    socket
        .connect(&endpoint)
        .map_err(|e| BowError::Transport(format!("connect {endpoint}: {e}")))?;
    socket
        .set_subscribe(b"")
        .map_err(|e| BowError::Transport(format!("subscribe: {e}")))?;

    info!(cam_id = %cam_id, endpoint = %endpoint, "subscriber connected");

    loop {
        let payload = match socket.recv_bytes(0) {
            Ok(p) => p,
            Err(e) => {
                warn!(cam_id = %cam_id, error = %e, "receive failed");
                continue;
            }
        };

        if let Err(e) = dispatch(registry, cam_id, &payload) {
            warn!(cam_id = %cam_id, error = %e, "event dropped");
        }
    }
}

/// Decode one message and route it into the camera's state.
pub(crate) fn dispatch(registry: &CameraRegistry, cam_id: &str, payload: &[u8]) -> Result<()> {
    let event: DetectionEvent = serde_json::from_slice(payload)
        .map_err(|e| BowError::Decode(format!("detection event: {e}")))?;

    let entry = registry
        .get(cam_id)
        .ok_or_else(|| BowError::UnknownCamera(cam_id.to_string()))?;

    match event {
        DetectionEvent::Arrow(arrow) => {
            entry.tracking.lock().add_event(&arrow);
            debug!(cam_id = %cam_id, case = ?arrow.case, "arrow event ingested");
        }
        DetectionEvent::Person(person) => {
            entry.person.lock().update(person.persons);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    fn registry() -> CameraRegistry {
        let config: ServerConfig = serde_json::from_str(
            r#"{"tracking": {"exclusion_zones": []},
                "cameras": [{"id": "cam1", "arrow_channel": "arrow_cam1"}]}"#,
        )
        .unwrap();
        CameraRegistry::from_config(&config)
    }

    #[test]
    fn test_dispatch_arrow_event() {
        let registry = registry();
        let payload = br#"{"type": "arrow", "bbox": [100.0, 100.0, 120.0, 140.0],
                           "motion_line": null, "timestamp": 1.0, "case": "B"}"#;
        dispatch(&registry, "cam1", payload).unwrap();
        assert_eq!(registry.get("cam1").unwrap().tracking.lock().buffer_len(), 1);
    }

    #[test]
    fn test_dispatch_person_event() {
        let registry = registry();
        let payload = br#"{"type": "person",
            "persons": [{"bbox": [0.0, 0.0, 5.0, 5.0], "confidence": 0.8, "state": "idle"}]}"#;
        dispatch(&registry, "cam1", payload).unwrap();
        let entry = registry.get("cam1").unwrap();
        assert_eq!(entry.person.lock().current().map(|d| d.len()), Some(1));
    }

    #[test]
    fn test_dispatch_unknown_camera() {
        let registry = registry();
        let payload = br#"{"type": "person", "persons": []}"#;
        let err = dispatch(&registry, "cam9", payload).unwrap_err();
        assert!(matches!(err, BowError::UnknownCamera(_)));
    }

    #[test]
    fn test_dispatch_malformed_payload() {
        let registry = registry();
        let err = dispatch(&registry, "cam1", b"not json").unwrap_err();
        assert!(matches!(err, BowError::Decode(_)));
        // State untouched.
        assert_eq!(registry.get("cam1").unwrap().tracking.lock().buffer_len(), 0);
    }
}
