//! Per-camera tracking state machine.
//!
//! One [`TrackingState`] exists per camera for the lifetime of the
//! process, owned by the registry and mutated by exactly two actors:
//! the camera's ingestion loop (`add_event`) and the detector loop
//! (`is_idle` / `find_hit_point` / `clear_buffer`). Callers serialize
//! access through the registry's per-camera mutex.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::debug;

use crate::config::TrackingConfig;
use crate::domain::events::{ArrowEvent, ArrowSample, HitResult};
use crate::domain::geometry::{self, point_in_rect, Point};
use crate::domain::target::TargetPolygon;

use super::hit;
use super::tracker::ArrowTracker;

/// Buffered trajectory, timers, and hit evaluation for one camera.
pub struct TrackingState {
    cam_id: String,
    config: TrackingConfig,
    tracker: ArrowTracker,
    buffer: VecDeque<ArrowSample>,
    target: Option<TargetPolygon>,
    frame_size: Option<(u32, u32)>,
    last_event_time: Option<Instant>,
    last_hit_time: Option<Instant>,
}

impl TrackingState {
    /// Create the state for one camera.
    pub fn new(cam_id: impl Into<String>, config: TrackingConfig) -> Self {
        let capacity = config.buffer_capacity();
        Self {
            cam_id: cam_id.into(),
            config,
            tracker: ArrowTracker::new(),
            buffer: VecDeque::with_capacity(capacity),
            target: None,
            frame_size: None,
            last_event_time: None,
            last_hit_time: None,
        }
    }

    /// The owning camera's id.
    pub fn cam_id(&self) -> &str {
        &self.cam_id
    }

    /// Current scoring polygon, if known.
    pub fn target(&self) -> Option<&TargetPolygon> {
        self.target.as_ref()
    }

    /// Source frame dimensions, if known.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    /// Number of buffered samples.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Borrow the buffered trajectory (debug visualization).
    pub fn buffer(&self) -> &VecDeque<ArrowSample> {
        &self.buffer
    }

    /// Install the scoring polygon (bootstrap or opportunistic update).
    pub fn set_target(&mut self, target: TargetPolygon) {
        self.target = Some(target);
    }

    /// Install the source frame dimensions.
    pub fn set_frame_size(&mut self, frame_size: (u32, u32)) {
        self.frame_size = Some(frame_size);
    }

    /// Whether the camera is inside its post-hit quiet period.
    pub fn in_cooldown(&self) -> bool {
        match self.last_hit_time {
            Some(t) => t.elapsed().as_secs_f64() < self.config.cooldown_sec,
            None => false,
        }
    }

    /// Feed one arrow detection.
    ///
    /// No-op during cooldown. Target and frame size ride along on any
    /// event carrying them. The tracker turns the detection into a
    /// tip/tail pair; samples touching an exclusion zone are discarded
    /// entirely, everything else lands in the buffer (oldest evicted at
    /// capacity) and refreshes the idle timer.
    pub fn add_event(&mut self, event: &ArrowEvent) {
        if self.in_cooldown() {
            debug!(cam_id = %self.cam_id, "in cooldown, skipping buffer append");
            return;
        }

        if let Some(points) = &event.target {
            self.target = Some(TargetPolygon::new(points.clone()));
        }
        if let Some([w, h]) = event.frame_size {
            self.frame_size = Some((w, h));
        }

        let estimate = match self.tracker.step(event.bbox, event.motion_line) {
            Some(e) => e,
            None => return,
        };

        let excluded = self
            .config
            .exclusion_zones
            .iter()
            .any(|&rect| point_in_rect(estimate.tip, rect) || point_in_rect(estimate.tail, rect));
        if excluded {
            debug!(cam_id = %self.cam_id, tip = ?estimate.tip, "detection inside exclusion zone, dropped");
            return;
        }

        if self.buffer.len() >= self.config.buffer_capacity() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(ArrowSample {
            tip: estimate.tip,
            tail: estimate.tail,
            timestamp: event.timestamp,
            case: event.case,
        });
        self.last_event_time = Some(Instant::now());
    }

    /// Whether the camera is ready for hit evaluation: a non-empty
    /// buffer, no detection for `idle_sec`, and not in cooldown.
    pub fn is_idle(&self) -> bool {
        if self.buffer.is_empty() || self.in_cooldown() {
            return false;
        }
        match self.last_event_time {
            Some(t) => t.elapsed().as_secs_f64() > self.config.idle_sec,
            None => false,
        }
    }

    /// Whether the buffer can yield a verdict (delegates to the hit
    /// module's validity rule).
    pub fn check_buffer_validity(&self) -> bool {
        hit::buffer_is_valid(&self.buffer)
    }

    /// Run the hit-point algorithm over the buffered trajectory.
    ///
    /// A `None` outcome (invalid buffer or stationary trajectory)
    /// clears the buffer immediately; on a verdict the caller clears
    /// after publishing, so the buffer survives long enough for the
    /// debug snapshot.
    pub fn find_hit_point(&mut self) -> Option<HitResult> {
        let outcome = hit::evaluate(&self.buffer, self.target.as_ref(), &self.config.hit);
        if outcome.is_none() {
            self.clear_buffer();
        }
        outcome
    }

    /// Enter cooldown. Called the moment a verdict exists, before any
    /// output side effect, so nothing can re-trigger while the hit is
    /// rendered and broadcast.
    pub fn mark_hit(&mut self) {
        self.last_hit_time = Some(Instant::now());
    }

    /// Drop the buffered trajectory and reset the tracker. Idempotent.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.tracker.reset();
    }

    /// Map a frame-space point into a viewer's render space; `None`
    /// until both sizes are known.
    pub fn to_render_coords(&self, p: Point, video_size: Option<(u32, u32)>) -> Option<Point> {
        let frame = self.frame_size?;
        let video = video_size?;
        Some(geometry::to_render_coords(p, frame, video))
    }

    /// The scoring polygon in a viewer's render space; `None` until the
    /// polygon and both sizes are known.
    pub fn polygon_to_render(&self, video_size: Option<(u32, u32)>) -> Option<Vec<Point>> {
        let target = self.target.as_ref()?;
        let frame = self.frame_size?;
        let video = video_size?;
        Some(target.to_render(frame, video))
    }
}
