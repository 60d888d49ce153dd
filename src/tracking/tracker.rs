//! Per-camera arrow tip/tail estimator.
//!
//! Converts a raw detection (box and/or directional line) into a
//! stabilized tip/tail pair. Only box-carrying detections yield output;
//! a line-only detection advances the filter and refreshes the cached
//! slope but produces nothing to buffer.

use crate::domain::geometry::Point;

use super::kalman::KalmanState;

/// Process noise matching the frame-paced detection cadence.
const PROCESS_NOISE_VAR: f64 = 0.05;
/// Measurement noise for box centroids.
const OBS_NOISE_VAR: f64 = 1.0;
/// Below this |vy| the direction is treated as numerically degenerate.
const SLOPE_EPSILON: f64 = 1e-6;

/// A stabilized shaft estimate: tip on the box's bottom edge, tail on
/// the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipTail {
    /// Leading (downrange) end of the shaft
    pub tip: Point,
    /// Trailing end of the shaft
    pub tail: Point,
}

/// Kalman-filtered tip/tail estimator, one per camera.
///
/// Owned exclusively by that camera's
/// [`TrackingState`](super::TrackingState).
#[derive(Debug, Default)]
pub struct ArrowTracker {
    /// `None` until the first real observation seeds the filter
    filter: Option<KalmanState>,
    /// dx/dy retained from the most recent line-carrying detection
    cached_slope: Option<f64>,
}

impl ArrowTracker {
    /// Create an uninitialized tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all filter state and the cached slope.
    pub fn reset(&mut self) {
        self.filter = None;
        self.cached_slope = None;
    }

    /// Feed one detection.
    ///
    /// Returns `None` when there is nothing to observe (both inputs
    /// absent) or when only a line is present — the line refreshes the
    /// cached slope and advances the filter's prediction, but without a
    /// box there is no extent to anchor a tip/tail pair to.
    pub fn step(&mut self, bbox: Option<[f64; 4]>, line: Option<[f64; 4]>) -> Option<TipTail> {
        if bbox.is_none() && line.is_none() {
            return None;
        }

        if let Some([lx1, ly1, lx2, ly2]) = line {
            let (dx, dy) = (lx2 - lx1, ly2 - ly1);
            if dy.abs() >= SLOPE_EPSILON {
                self.cached_slope = Some(dx / dy);
            }
        }

        let [bx1, by1, bx2, by2] = match bbox {
            Some(b) => b,
            None => {
                // Line-only frame: keep the filter moving, emit nothing.
                if let Some(filter) = &mut self.filter {
                    filter.predict();
                }
                return None;
            }
        };

        let cx = (bx1 + bx2) / 2.0;
        let cy = (by1 + by2) / 2.0;

        let filter = self
            .filter
            .get_or_insert_with(|| KalmanState::new([cx, cy], PROCESS_NOISE_VAR, OBS_NOISE_VAR));
        filter.predict();
        filter.update([cx, cy]);

        // Direction priority: explicit line, then filter velocity, then
        // the slope cached from an earlier line-carrying frame.
        let direction = match line {
            Some([lx1, ly1, lx2, ly2]) => Some((lx2 - lx1, ly2 - ly1)),
            None => {
                let [vx, vy] = filter.velocity();
                if vy.abs() >= SLOPE_EPSILON {
                    Some((vx, vy))
                } else {
                    self.cached_slope.map(|s| (s, 1.0))
                }
            }
        };

        let (tip, tail) = match direction {
            Some((vx, vy)) if vy.abs() >= SLOPE_EPSILON => {
                let slope = vx / vy;
                let tip_x = (cx + (by2 - cy) * slope).clamp(bx1, bx2);
                let tail_x = (cx - (cy - by1) * slope).clamp(bx1, bx2);
                ([tip_x, by2], [tail_x, by1])
            }
            // Near-horizontal shaft estimate: fall back to the box's
            // vertical extremes directly below/above the centroid.
            _ => ([cx, by2], [cx, by1]),
        };

        Some(TipTail { tip, tail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_nothing_to_observe() {
        let mut tracker = ArrowTracker::new();
        assert!(tracker.step(None, None).is_none());
    }

    /// A line-only frame produces no tip/tail and must not be buffered.
    #[test]
    fn test_step_line_only_yields_nothing() {
        let mut tracker = ArrowTracker::new();
        assert!(tracker.step(None, Some([0.0, 0.0, 10.0, 20.0])).is_none());
    }

    /// First box observation: zero velocity, no line, no cached slope —
    /// the degenerate fallback places tip/tail at the vertical extremes.
    #[test]
    fn test_step_first_box_vertical_fallback() {
        let mut tracker = ArrowTracker::new();
        let out = tracker.step(Some([100.0, 50.0, 120.0, 90.0]), None).unwrap();
        assert_eq!(out.tip, [110.0, 90.0]);
        assert_eq!(out.tail, [110.0, 50.0]);
    }

    /// An explicit line orients the tip/tail along the shaft.
    #[test]
    fn test_step_line_direction_applied() {
        let mut tracker = ArrowTracker::new();
        // Shaft descending left-to-right at 45°: dx = dy → slope 1.
        let out = tracker
            .step(Some([100.0, 100.0, 140.0, 140.0]), Some([100.0, 100.0, 140.0, 140.0]))
            .unwrap();
        // Centroid (120, 120); tip x = 120 + 20·1 = 140, tail x = 100.
        assert_eq!(out.tip, [140.0, 140.0]);
        assert_eq!(out.tail, [100.0, 100.0]);
    }

    /// Tip/tail x never escapes the box's horizontal extent.
    #[test]
    fn test_step_clamps_to_box() {
        let mut tracker = ArrowTracker::new();
        // Very shallow line: slope far larger than the box is wide.
        let out = tracker
            .step(Some([100.0, 100.0, 120.0, 140.0]), Some([0.0, 0.0, 200.0, 10.0]))
            .unwrap();
        assert!(out.tip[0] >= 100.0 && out.tip[0] <= 120.0);
        assert!(out.tail[0] >= 100.0 && out.tail[0] <= 120.0);
    }

    /// The slope cached from a line-carrying frame orients a later
    /// box-only frame whose filter velocity is still degenerate.
    #[test]
    fn test_cached_slope_survives_to_box_frame() {
        let mut tracker = ArrowTracker::new();
        tracker.step(None, Some([0.0, 0.0, 40.0, 40.0])); // slope 1 cached
        let out = tracker.step(Some([100.0, 100.0, 140.0, 140.0]), None).unwrap();
        // Without the cache this would be the vertical fallback at x = 120.
        assert_eq!(out.tip, [140.0, 140.0]);
        assert_eq!(out.tail, [100.0, 100.0]);
    }

    #[test]
    fn test_reset_clears_cache_and_filter() {
        let mut tracker = ArrowTracker::new();
        tracker.step(Some([100.0, 100.0, 140.0, 140.0]), Some([0.0, 0.0, 40.0, 40.0]));
        tracker.reset();
        // After reset the next box-only frame is back to the fallback.
        let out = tracker.step(Some([100.0, 100.0, 140.0, 140.0]), None).unwrap();
        assert_eq!(out.tip, [120.0, 140.0]);
        assert_eq!(out.tail, [120.0, 100.0]);
    }
}
