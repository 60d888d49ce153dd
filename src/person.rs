//! Latest-person-detection state, one per camera.

use std::time::{Duration, Instant};

use crate::domain::events::PersonDetection;

/// Staleness window for person detections.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

/// Holds the most recent person detections for one camera.
///
/// Person detections are advisory overlay data; rather than buffering a
/// history, only the latest frame is kept and it expires after a short
/// timeout so a stalled detector reads as "nobody visible".
pub struct PersonState {
    detections: Vec<PersonDetection>,
    updated_at: Option<Instant>,
    timeout: Duration,
}

impl Default for PersonState {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl PersonState {
    /// Create with a custom staleness timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { detections: Vec::new(), updated_at: None, timeout }
    }

    /// Replace the detection list with this frame's.
    pub fn update(&mut self, detections: Vec<PersonDetection>) {
        self.detections = detections;
        self.updated_at = Some(Instant::now());
    }

    /// The latest detections, or `None` once they are stale.
    pub fn current(&self) -> Option<&[PersonDetection]> {
        let updated_at = self.updated_at?;
        if updated_at.elapsed() > self.timeout {
            return None;
        }
        Some(&self.detections)
    }
}
