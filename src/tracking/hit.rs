//! The geometric hit-point algorithm.
//!
//! Invoked once per shot, after a camera has gone idle with a valid
//! trajectory buffer. The buffer holds tip/tail samples ordered by
//! arrival; an impact shows up as an *inflection* — the first index
//! where the tip's vertical motion reverses. From there the point is
//! derived by containment, shaft-line intersection, or boundary
//! projection, in that order.
//!
//! Two strategies share this module (see
//! [`HitStrategy`](crate::config::HitStrategy)): the refined pipeline
//! implements every step below; the basic variant skips the
//! intersection step, scans the whole buffer for a contained tip
//! instead, and runs with lower thresholds. Both report through the
//! same [`HitKind`] taxonomy.

use std::collections::VecDeque;

use crate::config::{HitConfig, HitStrategy};
use crate::domain::events::{ArrowSample, DetectionCase, HitKind, HitResult};
use crate::domain::geometry::{line_intersection, Point};
use crate::domain::target::TargetPolygon;

/// Whether the buffer can yield a verdict at all: at least two samples,
/// and not made exclusively of line-only detections (those carry no
/// reliable tip geometry, so an all-line buffer cannot anchor an
/// inflection).
pub fn buffer_is_valid(buffer: &VecDeque<ArrowSample>) -> bool {
    if buffer.len() < 2 {
        return false;
    }
    !buffer.iter().all(|s| s.case == DetectionCase::LineOnly)
}

/// Evaluate the buffered trajectory.
///
/// Returns `None` when the buffer is invalid or its vertical span is
/// below the stationary-object threshold; any other outcome is a
/// verdict (hit or miss) the caller must publish exactly once.
pub fn evaluate(
    buffer: &VecDeque<ArrowSample>,
    target: Option<&TargetPolygon>,
    config: &HitConfig,
) -> Option<HitResult> {
    if !buffer_is_valid(buffer) {
        return None;
    }

    let ys: Vec<f64> = buffer.iter().map(|s| s.tip[1]).collect();
    let y_min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let height = y_max - y_min;
    if height < config.min_height() {
        return None;
    }

    // First index where the tip stopped descending.
    let mut hit_idx = ys.windows(2).position(|w| w[1] < w[0]);

    // An inflection in a near-empty buffer is more likely detector
    // noise than an impact.
    if hit_idx.is_some() && buffer.len() < config.min_inflection_samples() {
        hit_idx = None;
    }

    let result = match (hit_idx, config.strategy) {
        (Some(i), HitStrategy::Refined) => inflection_refined(buffer, i, target, config, height),
        (Some(i), HitStrategy::Basic) => inflection_basic(buffer, i, target, config, height),
        (None, HitStrategy::Refined) => miss_refined(buffer, target, config, height),
        (None, HitStrategy::Basic) => miss_basic(buffer, target, height),
    };
    Some(result)
}

// ---------------------------------------------------------------------------
// Refined strategy
// ---------------------------------------------------------------------------

fn inflection_refined(
    buffer: &VecDeque<ArrowSample>,
    i: usize,
    target: Option<&TargetPolygon>,
    config: &HitConfig,
    height: f64,
) -> HitResult {
    let raw = buffer[i].tip;

    let target = match target {
        Some(t) => t,
        None => return result(raw, false, HitKind::NoTargetInfo, height),
    };

    if target.contains(raw) {
        return result(raw, true, HitKind::InflectionHit, height);
    }

    // The detection was too coarse to catch the tip inside the target:
    // extend the shaft lines at and after the inflection and test where
    // they cross.
    let before = &buffer[i];
    let after = &buffer[i + 1];
    if let Some(p) = line_intersection(before.tip, before.tail, after.tip, after.tail) {
        if target.contains(p) {
            return result(p, true, HitKind::IntersectionInsideTarget, height);
        }
    }

    match target.closest_boundary_point(raw) {
        Some(boundary) => {
            let p = nudge_toward_centroid(boundary, target, config.projection_nudge());
            result(p, true, HitKind::ProjectedToTarget, height)
        }
        None => result(raw, false, HitKind::NoClosestPoint, height),
    }
}

fn miss_refined(
    buffer: &VecDeque<ArrowSample>,
    target: Option<&TargetPolygon>,
    config: &HitConfig,
    height: f64,
) -> HitResult {
    // No inflection: the arrow passed through the view.
    let raw = buffer
        .back()
        .map(|s| s.tip)
        .unwrap_or_default();

    let target = match target {
        Some(t) => t,
        None => return result(raw, false, HitKind::MissNoTarget, height),
    };

    if target.contains(raw) {
        // A pass-through tip resting inside the target means the
        // trajectory was too coarse to see the inflection; report the
        // miss just below the target instead of a phantom hit.
        let bottom = target.bottom_y().unwrap_or(raw[1]);
        return result([raw[0], bottom + 10.0], false, HitKind::MissInsideTarget, height);
    }

    match target.bbox() {
        Some((min_x, min_y, max_x, max_y)) => {
            let margin = config.miss_margin();
            let clamped = [
                raw[0].clamp(min_x - margin, max_x + margin),
                raw[1].clamp(min_y - margin, max_y + margin),
            ];
            result(clamped, false, HitKind::MissGeneral, height)
        }
        None => result(raw, false, HitKind::MissNoTarget, height),
    }
}

// ---------------------------------------------------------------------------
// Basic strategy
// ---------------------------------------------------------------------------

fn inflection_basic(
    buffer: &VecDeque<ArrowSample>,
    i: usize,
    target: Option<&TargetPolygon>,
    config: &HitConfig,
    height: f64,
) -> HitResult {
    let raw = buffer[i].tip;

    let target = match target {
        Some(t) => t,
        None => return result(raw, false, HitKind::NoTargetInfo, height),
    };

    if target.contains(raw) {
        return result(raw, true, HitKind::InflectionHit, height);
    }
    if let Some(sample) = buffer.iter().find(|s| target.contains(s.tip)) {
        return result(sample.tip, true, HitKind::InflectionHit, height);
    }

    match target.closest_boundary_point(raw) {
        Some(boundary) => {
            let p = nudge_toward_centroid(boundary, target, config.projection_nudge());
            result(p, true, HitKind::ProjectedToTarget, height)
        }
        None => result(raw, false, HitKind::NoClosestPoint, height),
    }
}

fn miss_basic(
    buffer: &VecDeque<ArrowSample>,
    target: Option<&TargetPolygon>,
    height: f64,
) -> HitResult {
    let raw = buffer
        .back()
        .map(|s| s.tip)
        .unwrap_or_default();

    let target = match target {
        Some(t) => t,
        None => return result(raw, false, HitKind::MissNoTarget, height),
    };

    if target.contains(raw) {
        return result(raw, true, HitKind::InflectionHit, height);
    }
    if let Some(sample) = buffer.iter().find(|s| target.contains(s.tip)) {
        return result(sample.tip, true, HitKind::InflectionHit, height);
    }
    result(raw, false, HitKind::MissGeneral, height)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Push a boundary point `nudge` pixels along the vector toward the
/// polygon centroid, so projected hits land visibly inside the target
/// rather than on its edge. Degenerate centroids leave the point as-is.
fn nudge_toward_centroid(boundary: Point, target: &TargetPolygon, nudge: f64) -> Point {
    let centroid = match target.centroid() {
        Some(c) => c,
        None => return boundary,
    };
    let dx = centroid[0] - boundary[0];
    let dy = centroid[1] - boundary[1];
    let length = (dx * dx + dy * dy).sqrt();
    if length <= 0.0 {
        return boundary;
    }
    [boundary[0] + dx / length * nudge, boundary[1] + dy / length * nudge]
}

fn result(point: Point, inside: bool, kind: HitKind, height: f64) -> HitResult {
    HitResult { point, inside, kind, h: height }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
