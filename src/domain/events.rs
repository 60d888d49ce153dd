//! Detection wire model and hit verdicts.
//!
//! Detection events arrive as JSON over the per-camera pub/sub channel:
//!
//! ```json
//! {"type": "arrow", "bbox": [612.0, 140.0, 660.0, 188.0],
//!  "motion_line": [610.0, 130.0, 665.0, 195.0],
//!  "timestamp": 1716891234.202, "case": "A",
//!  "target": [[480.0, 120.0], ...], "frame_size": [1280, 720]}
//! ```
//!
//! ```json
//! {"type": "person", "persons": [{"bbox": [100.0, 60.0, 180.0, 320.0],
//!  "confidence": 0.91, "state": "drawing"}]}
//! ```

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Classification tag attached by the inference process to every arrow
/// detection, describing what the detector actually saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionCase {
    /// Bounding box and directional motion line
    #[serde(rename = "A")]
    BoxAndLine,
    /// Bounding box only
    #[serde(rename = "B")]
    BoxOnly,
    /// Straight motion line only, no box
    #[serde(rename = "C")]
    LineOnly,
}

/// A single message from a detection source.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionEvent {
    /// Arrow detection for one frame
    Arrow(ArrowEvent),
    /// Person detections for one frame
    Person(PersonEvent),
}

/// Per-frame arrow detection.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrowEvent {
    /// Detection box (x1, y1, x2, y2), absent for line-only frames
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// Directional motion line (x1, y1, x2, y2), tail to tip
    #[serde(default)]
    pub motion_line: Option<[f64; 4]>,
    /// Source-side capture timestamp (seconds since epoch)
    pub timestamp: f64,
    /// Detection classification tag
    pub case: DetectionCase,
    /// Scoring polygon, attached opportunistically by the source
    #[serde(default)]
    pub target: Option<Vec<Point>>,
    /// Source frame dimensions (width, height)
    #[serde(default)]
    pub frame_size: Option<[u32; 2]>,
}

/// Per-frame person detections.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonEvent {
    /// All persons visible in the frame
    pub persons: Vec<PersonDetection>,
}

/// One detected person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetection {
    /// Detection box (x1, y1, x2, y2)
    pub bbox: [f64; 4],
    /// Detector confidence [0, 1]
    pub confidence: f64,
    /// Pose/activity label assigned by the detector
    pub state: String,
}

/// A stabilized tip/tail pair accepted into a camera's trajectory buffer.
#[derive(Debug, Clone, Copy)]
pub struct ArrowSample {
    /// Leading (downrange) end of the shaft
    pub tip: Point,
    /// Trailing end of the shaft
    pub tail: Point,
    /// Source-side capture timestamp
    pub timestamp: f64,
    /// Classification tag of the originating detection
    pub case: DetectionCase,
}

/// How the hit point was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HitKind {
    /// Inflection tip lay inside the target
    InflectionHit,
    /// Shaft-line intersection around the inflection lay inside the target
    IntersectionInsideTarget,
    /// Inflection tip projected onto the target boundary and nudged inward
    ProjectedToTarget,
    /// A target exists but no boundary projection was computable
    NoClosestPoint,
    /// Inflection found but no target is known for this camera
    NoTargetInfo,
    /// No inflection, yet the last tip sat inside the target; relocated below it
    MissInsideTarget,
    /// No inflection; point clamped near the target
    MissGeneral,
    /// No inflection and no target known
    MissNoTarget,
}

/// Outcome of one idle-triggered hit evaluation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HitResult {
    /// Decided impact point in frame-pixel space
    pub point: Point,
    /// Whether the point counts as inside the scoring area
    pub inside: bool,
    /// Derivation of the point
    #[serde(rename = "type")]
    pub kind: HitKind,
    /// Vertical span of the buffered trajectory (stationary-object filter)
    pub h: f64,
}

/// A hit verdict tagged with its camera, as published on the internal bus.
#[derive(Debug, Clone)]
pub struct HitEnvelope {
    /// Camera that produced the verdict
    pub cam_id: String,
    /// The verdict itself
    pub result: HitResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_event_decode() {
        let json = r#"{
            "type": "arrow",
            "bbox": [612.0, 140.0, 660.0, 188.0],
            "motion_line": [610.0, 130.0, 665.0, 195.0],
            "timestamp": 1716891234.202,
            "case": "A",
            "target": [[480.0, 120.0], [800.0, 120.0], [800.0, 420.0], [480.0, 420.0]],
            "frame_size": [1280, 720]
        }"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        match event {
            DetectionEvent::Arrow(arrow) => {
                assert_eq!(arrow.case, DetectionCase::BoxAndLine);
                assert_eq!(arrow.frame_size, Some([1280, 720]));
                assert_eq!(arrow.target.as_ref().map(|t| t.len()), Some(4));
            }
            other => panic!("expected arrow event, got {other:?}"),
        }
    }

    #[test]
    fn test_arrow_event_minimal_decode() {
        // target and frame_size are optional, bbox may be null for case C.
        let json = r#"{
            "type": "arrow",
            "bbox": null,
            "motion_line": [610.0, 130.0, 665.0, 195.0],
            "timestamp": 1716891234.202,
            "case": "C"
        }"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        match event {
            DetectionEvent::Arrow(arrow) => {
                assert!(arrow.bbox.is_none());
                assert_eq!(arrow.case, DetectionCase::LineOnly);
                assert!(arrow.target.is_none());
            }
            other => panic!("expected arrow event, got {other:?}"),
        }
    }

    #[test]
    fn test_person_event_decode() {
        let json = r#"{
            "type": "person",
            "persons": [{"bbox": [1.0, 2.0, 3.0, 4.0], "confidence": 0.9, "state": "idle"}]
        }"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        match event {
            DetectionEvent::Person(person) => assert_eq!(person.persons.len(), 1),
            other => panic!("expected person event, got {other:?}"),
        }
    }

    #[test]
    fn test_hit_kind_wire_names() {
        let json = serde_json::to_string(&HitKind::InflectionHit).unwrap();
        assert_eq!(json, "\"INFLECTION_HIT\"");
        let json = serde_json::to_string(&HitKind::MissNoTarget).unwrap();
        assert_eq!(json, "\"MISS_NO_TARGET\"");
    }
}
