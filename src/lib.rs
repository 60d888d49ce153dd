//! # SmartBow
//!
//! Arrow tracking and hit detection for instrumented archery ranges.
//!
//! An external inference process publishes per-frame detections (arrow
//! bounding boxes / motion lines, person boxes) over local pub/sub
//! channels, one stream per camera. This crate turns those noisy,
//! partial detections into a single authoritative "hit" decision per
//! shot and pushes the result to connected viewers in their own video
//! coordinate space.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────┐   ┌───────────┐
//! │ Ingestion  │──▶│  Registry    │◀──│ Detector Loop │──▶│ Live Feed │
//! │ (ZMQ SUB,  │   │ cam id →     │   │ 100 ms poll,  │   │ WebSocket │
//! │ 1/cam/src) │   │ TrackingState│   │ hit algorithm │   │ sessions  │
//! └────────────┘   └──────────────┘   └───────────────┘   └───────────┘
//! ```
//!
//! Each camera owns a [`tracking::TrackingState`]: a Kalman-smoothed
//! tip/tail estimator feeding a bounded trajectory buffer with idle and
//! cooldown timers. The background [`detect::DetectorLoop`] polls every
//! camera; once a camera goes idle the buffered trajectory is evaluated
//! by the geometric hit-point algorithm (inflection detection, line
//! intersection, polygon containment/projection) and the verdict is
//! broadcast to that camera's viewers.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod detect;
pub mod domain;
pub mod frame;
pub mod ingest;
pub mod person;
pub mod registry;
pub mod tracking;

pub use config::{CameraConfig, HitConfig, HitStrategy, ServerConfig, TrackingConfig};
pub use domain::events::{ArrowEvent, DetectionEvent, HitEnvelope, HitKind, HitResult};
pub use domain::target::TargetPolygon;
pub use registry::CameraRegistry;
pub use tracking::{ArrowTracker, TrackingState};

/// Common result type for SmartBow operations.
pub type Result<T> = std::result::Result<T, BowError>;

/// Unified error type for SmartBow operations.
#[derive(Debug, thiserror::Error)]
pub enum BowError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure (socket setup, send/receive)
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed detection or viewer message
    #[error("decode error: {0}")]
    Decode(String),

    /// Event addressed to a camera the registry does not know
    #[error("unknown camera id: {0}")]
    UnknownCamera(String),

    /// Debug snapshot could not be produced
    #[error("visualization error: {0}")]
    Visualize(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
