//! Background hit-detection loop.
//!
//! A single long-lived task polls every registered camera on a fixed
//! cadence. Cross-camera ordering is whatever the registry iterates;
//! the only guarantee that matters is bounded detection latency, which
//! the poll interval provides.

pub mod visualize;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::domain::events::HitEnvelope;
use crate::frame::FrameStore;
use crate::registry::{CameraEntry, CameraRegistry};
use crate::Result;

/// Default poll cadence across all cameras.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after a sweep-level fault before resuming.
const FAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Polls all cameras for idleness and publishes hit verdicts.
pub struct DetectorLoop {
    registry: Arc<CameraRegistry>,
    frames: Arc<FrameStore>,
    hits: broadcast::Sender<HitEnvelope>,
    poll_interval: Duration,
    snapshot_dir: Option<PathBuf>,
}

impl DetectorLoop {
    /// Create the loop. Verdicts are published on `hits`; viewers (and
    /// tests) subscribe to that channel.
    pub fn new(
        registry: Arc<CameraRegistry>,
        frames: Arc<FrameStore>,
        hits: broadcast::Sender<HitEnvelope>,
    ) -> Self {
        Self {
            registry,
            frames,
            hits,
            poll_interval: DEFAULT_POLL_INTERVAL,
            snapshot_dir: None,
        }
    }

    /// Override the poll cadence.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enable debug snapshots under this directory.
    pub fn with_snapshot_dir(mut self, dir: PathBuf) -> Self {
        self.snapshot_dir = Some(dir);
        self
    }

    /// Run forever. Per-camera faults abort only that camera's cycle; a
    /// sweep-level fault pauses briefly and resumes rather than taking
    /// the process down.
    pub async fn run(self) {
        info!(cameras = self.registry.len(), interval_ms = self.poll_interval.as_millis() as u64,
              "detector loop started");
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.sweep() {
                error!(error = %e, "detector sweep failed");
                tokio::time::sleep(FAULT_BACKOFF).await;
            }
        }
    }

    /// One pass over every camera.
    fn sweep(&self) -> Result<()> {
        for (cam_id, entry) in self.registry.iter() {
            if let Err(e) = self.process_camera(cam_id, entry) {
                error!(cam_id = %cam_id, error = %e, "camera cycle failed");
            }
        }
        Ok(())
    }

    /// Evaluate one camera if it has gone idle.
    fn process_camera(&self, cam_id: &str, entry: &Arc<CameraEntry>) -> Result<()> {
        let mut tracking = entry.tracking.lock();
        if !tracking.is_idle() {
            return Ok(());
        }

        if let Some(result) = tracking.find_hit_point() {
            // Cooldown starts before any output side effect so renders
            // and broadcasts cannot race a second trigger.
            tracking.mark_hit();

            if let Some(dir) = &self.snapshot_dir {
                let frame = self.frames.latest(cam_id);
                match visualize::snapshot(dir, cam_id, frame, tracking.buffer(), &result) {
                    Ok(path) => debug!(cam_id = %cam_id, path = %path.display(), "snapshot written"),
                    Err(e) => warn!(cam_id = %cam_id, error = %e, "snapshot failed"),
                }
            }

            info!(cam_id = %cam_id, kind = ?result.kind, inside = result.inside,
                  point = ?result.point, "hit decided");
            // No subscribers is fine; the feed may simply have no viewers.
            let _ = self.hits.send(HitEnvelope { cam_id: cam_id.to_string(), result });
        }

        tracking.clear_buffer();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::domain::events::{ArrowEvent, DetectionCase, HitKind};

    fn registry(idle_sec: f64, cooldown_sec: f64) -> Arc<CameraRegistry> {
        let config: ServerConfig = serde_json::from_str(&format!(
            r#"{{"tracking": {{"idle_sec": {idle_sec}, "cooldown_sec": {cooldown_sec},
                 "exclusion_zones": []}},
                 "cameras": [{{"id": "cam1", "arrow_channel": "arrow_cam1"}}]}}"#
        ))
        .unwrap();
        Arc::new(CameraRegistry::from_config(&config))
    }

    fn arrow_event(y: f64, target: Option<Vec<[f64; 2]>>) -> ArrowEvent {
        ArrowEvent {
            bbox: Some([480.0, y - 40.0, 520.0, y]),
            motion_line: None,
            timestamp: 0.0,
            case: DetectionCase::BoxOnly,
            target,
            frame_size: Some([1280, 720]),
        }
    }

    #[tokio::test]
    async fn test_idle_camera_produces_one_verdict() {
        let registry = registry(0.0, 30.0);
        let frames = Arc::new(FrameStore::new());
        let (tx, mut rx) = broadcast::channel(16);

        let target = vec![[400.0, 250.0], [600.0, 250.0], [600.0, 360.0], [400.0, 360.0]];
        {
            let entry = registry.get("cam1").unwrap();
            let mut tracking = entry.tracking.lock();
            // Descend 240→340, then rise: inflection at the deepest tip,
            // which lies inside the target polygon.
            for y in [240.0, 265.0, 290.0, 315.0, 340.0, 320.0, 300.0] {
                tracking.add_event(&arrow_event(y, Some(target.clone())));
            }
        }

        let detector = DetectorLoop::new(registry.clone(), frames, tx)
            .with_poll_interval(Duration::from_millis(10));
        tokio::spawn(detector.run());

        let envelope = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("verdict within deadline")
            .expect("channel open");
        assert_eq!(envelope.cam_id, "cam1");
        assert_eq!(envelope.result.kind, HitKind::InflectionHit);
        assert!(envelope.result.inside);

        // Cooldown holds: no second verdict and the buffer is empty.
        assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.is_err());
        let entry = registry.get("cam1").unwrap();
        assert_eq!(entry.tracking.lock().buffer_len(), 0);
    }

    #[tokio::test]
    async fn test_quiet_cameras_emit_nothing() {
        let registry = registry(0.0, 30.0);
        let frames = Arc::new(FrameStore::new());
        let (tx, mut rx) = broadcast::channel(16);

        let detector = DetectorLoop::new(registry, frames, tx)
            .with_poll_interval(Duration::from_millis(10));
        tokio::spawn(detector.run());

        assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }
}
