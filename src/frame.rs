//! Shared most-recent-frame store.
//!
//! An external capture process writes the newest frame per camera; the
//! core only ever reads it, and only for best-effort debug snapshots.
//! Missing frames are normal (capture not running, camera cold).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// One decoded video frame, RGB8, row-major.
pub struct CameraFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGB8 pixel data, `width * height * 3` bytes
    pub pixels: Vec<u8>,
    /// Capture wall-clock time
    pub captured_at: DateTime<Utc>,
}

/// Per-camera latest-frame buffer.
#[derive(Default)]
pub struct FrameStore {
    frames: RwLock<HashMap<String, Arc<CameraFrame>>>,
}

impl FrameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a camera's latest frame (called by the capture side).
    pub fn publish(&self, cam_id: &str, frame: CameraFrame) {
        self.frames.write().insert(cam_id.to_string(), Arc::new(frame));
    }

    /// The most recent frame for a camera, if any has been published.
    pub fn latest(&self, cam_id: &str) -> Option<Arc<CameraFrame>> {
        self.frames.read().get(cam_id).cloned()
    }
}
