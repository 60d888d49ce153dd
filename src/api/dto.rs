//! Viewer protocol messages.
//!
//! Everything on the wire is JSON with a `type` tag.
//!
//! Client → server:
//! - `{"type": "video_size", "width": 960, "height": 540}`
//!
//! Server → client:
//! - `{"type": "polygon", "points": [[x, y], ...]}` — one-shot after the
//!   viewer reports its video size
//! - `{"type": "hit", "tip": [x, y], "inside": true}` — pushed per shot
//!
//! No other message types are defined; unrecognized client messages are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::Point;

/// Message pushed to a viewer, already in its render space.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerMessage {
    /// Scoring polygon overlay
    Polygon {
        /// Polygon vertices in render space
        points: Vec<Point>,
    },
    /// A decided shot
    Hit {
        /// Impact point in render space
        tip: Point,
        /// Whether the shot scored
        inside: bool,
    },
}

/// Message received from a viewer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerCommand {
    /// The viewer reports (or re-reports) its video element size
    VideoSize {
        /// Render width in pixels
        width: u32,
        /// Render height in pixels
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_message_encoding() {
        let msg = ViewerMessage::Hit { tip: [120.5, 340.0], inside: true };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "hit");
        assert_eq!(json["tip"][0], 120.5);
        assert_eq!(json["inside"], true);
    }

    #[test]
    fn test_polygon_message_encoding() {
        let msg = ViewerMessage::Polygon { points: vec![[0.0, 0.0], [10.0, 0.0]] };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "polygon");
        assert_eq!(json["points"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_video_size_decoding() {
        let cmd: ViewerCommand =
            serde_json::from_str(r#"{"type": "video_size", "width": 960, "height": 540}"#).unwrap();
        let ViewerCommand::VideoSize { width, height } = cmd;
        assert_eq!((width, height), (960, 540));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(serde_json::from_str::<ViewerCommand>(r#"{"type": "reboot"}"#).is_err());
    }
}
