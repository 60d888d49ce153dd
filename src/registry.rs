//! Process-wide camera registry.
//!
//! Built once at startup from static camera configuration and shared as
//! `Arc<CameraRegistry>`; the map itself is never mutated afterward, so
//! lookups are lock-free and only the per-camera state carries a mutex.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ServerConfig;
use crate::person::PersonState;
use crate::tracking::TrackingState;

/// All mutable state owned by one camera.
pub struct CameraEntry {
    /// Arrow trajectory state machine
    pub tracking: Mutex<TrackingState>,
    /// Latest person detections
    pub person: Mutex<PersonState>,
}

/// Concurrency-safe mapping from camera id to its state.
pub struct CameraRegistry {
    cameras: HashMap<String, Arc<CameraEntry>>,
}

impl CameraRegistry {
    /// Build the registry from server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let cameras = config
            .cameras
            .iter()
            .map(|cam| {
                let tracking = TrackingState::new(cam.id.clone(), config.tracking_for(cam));
                let entry = CameraEntry {
                    tracking: Mutex::new(tracking),
                    person: Mutex::new(PersonState::default()),
                };
                (cam.id.clone(), Arc::new(entry))
            })
            .collect();
        Self { cameras }
    }

    /// Look up one camera's state.
    pub fn get(&self, cam_id: &str) -> Option<Arc<CameraEntry>> {
        self.cameras.get(cam_id).cloned()
    }

    /// Iterate over all cameras in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<CameraEntry>)> {
        self.cameras.iter()
    }

    /// Number of registered cameras.
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    fn config() -> ServerConfig {
        serde_json::from_str(
            r#"{"cameras": [
                {"id": "cam1", "arrow_channel": "arrow_cam1"},
                {"id": "cam2", "arrow_channel": "arrow_cam2"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_registry_from_config() {
        let registry = CameraRegistry::from_config(&config());
        assert_eq!(registry.len(), 2);
        assert!(registry.get("cam1").is_some());
        assert!(registry.get("cam3").is_none());
    }

    #[test]
    fn test_registry_entries_are_shared() {
        let registry = CameraRegistry::from_config(&config());
        let a = registry.get("cam1").unwrap();
        let b = registry.get("cam1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_per_camera_exclusion_override_applies() {
        let config: ServerConfig = serde_json::from_str(
            r#"{"cameras": [
                {"id": "cam1", "arrow_channel": "a",
                 "exclusion_zones": [[0.0, 0.0, 5000.0, 5000.0]]}
            ]}"#,
        )
        .unwrap();
        let registry = CameraRegistry::from_config(&config);
        let entry = registry.get("cam1").unwrap();

        // Everything lands inside the giant exclusion zone.
        let mut tracking = entry.tracking.lock();
        tracking.add_event(&crate::domain::events::ArrowEvent {
            bbox: Some([100.0, 100.0, 120.0, 140.0]),
            motion_line: None,
            timestamp: 0.0,
            case: crate::domain::events::DetectionCase::BoxOnly,
            target: None,
            frame_size: None,
        });
        assert_eq!(tracking.buffer_len(), 0);
    }

    #[test]
    fn test_camera_config_roundtrip() {
        let cam = CameraConfig {
            id: "cam9".into(),
            arrow_channel: "arrow_cam9".into(),
            person_channel: None,
            target_channel: Some("target_cam9".into()),
            exclusion_zones: None,
        };
        let json = serde_json::to_string(&cam).unwrap();
        let back: CameraConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "cam9");
        assert_eq!(back.target_channel.as_deref(), Some("target_cam9"));
    }
}
