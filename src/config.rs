//! Server, camera, and algorithm configuration.
//!
//! Loaded from a JSON file at startup:
//!
//! ```json
//! {
//!   "tracking": {"idle_sec": 2.0, "cooldown_sec": 8.0,
//!                "hit": {"strategy": "refined"}},
//!   "cameras": [
//!     {"id": "cam1", "arrow_channel": "arrow_infer_cam1",
//!      "person_channel": "person_infer_cam1",
//!      "target_channel": "target_info_cam1"}
//!   ]
//! }
//! ```
//!
//! Channel names address `ipc:///tmp/<name>.ipc` endpoints published by
//! the inference and configuration processes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{BowError, Result};

/// Which hit-point algorithm a deployment runs.
///
/// The two strategies share the trajectory model but differ in
/// thresholds and in how much geometry they apply before giving up:
/// [`HitStrategy::Refined`] adds the shaft-intersection step and trusts
/// an inflection only on a reasonably full buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitStrategy {
    /// Lower-threshold containment/projection variant
    Basic,
    /// Full inflection / intersection / projection pipeline (default)
    #[default]
    Refined,
}

/// Tunables of the hit-point algorithm.
///
/// Unset fields resolve to per-strategy defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HitConfig {
    /// Algorithm variant
    #[serde(default)]
    pub strategy: HitStrategy,
    #[serde(default)]
    min_height: Option<f64>,
    #[serde(default)]
    min_inflection_samples: Option<usize>,
    #[serde(default)]
    projection_nudge: Option<f64>,
    #[serde(default)]
    miss_margin: Option<f64>,
}

impl HitConfig {
    /// The refined strategy with its defaults.
    pub fn refined() -> Self {
        Self { strategy: HitStrategy::Refined, ..Self::default() }
    }

    /// The basic strategy with its defaults.
    pub fn basic() -> Self {
        Self { strategy: HitStrategy::Basic, ..Self::default() }
    }

    /// Minimum vertical trajectory span; shorter buffers are treated as
    /// stationary false positives.
    pub fn min_height(&self) -> f64 {
        self.min_height.unwrap_or(match self.strategy {
            HitStrategy::Refined => 50.0,
            HitStrategy::Basic => 25.0,
        })
    }

    /// Minimum buffered samples before an early inflection is trusted.
    pub fn min_inflection_samples(&self) -> usize {
        self.min_inflection_samples.unwrap_or(match self.strategy {
            HitStrategy::Refined => 5,
            HitStrategy::Basic => 0,
        })
    }

    /// How far a boundary projection is nudged toward the target
    /// centroid, in frame pixels.
    pub fn projection_nudge(&self) -> f64 {
        self.projection_nudge.unwrap_or(35.0)
    }

    /// Bounding-box expansion applied when clamping a general miss, in
    /// frame pixels.
    pub fn miss_margin(&self) -> f64 {
        self.miss_margin.unwrap_or(50.0)
    }

    /// Override the minimum trajectory height.
    pub fn with_min_height(mut self, v: f64) -> Self {
        self.min_height = Some(v);
        self
    }

    /// Override the minimum sample count for early inflections.
    pub fn with_min_inflection_samples(mut self, v: usize) -> Self {
        self.min_inflection_samples = Some(v);
        self
    }
}

fn default_idle_sec() -> f64 {
    2.0
}

fn default_cooldown_sec() -> f64 {
    8.0
}

/// A small set of known false-positive rectangles; detections landing
/// inside are discarded before buffering. The default covers the rangefinder
/// housing visible in the stock camera mount.
fn default_exclusion_zones() -> Vec<[f64; 4]> {
    vec![[640.0, 280.0, 700.0, 410.0]]
}

/// Per-camera tracking tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Trajectory buffer capacity; unset resolves per strategy
    #[serde(default)]
    buffer_capacity: Option<usize>,
    /// Seconds without an arrow detection before hit evaluation
    #[serde(default = "default_idle_sec")]
    pub idle_sec: f64,
    /// Post-hit quiet period suppressing buffering and detection
    #[serde(default = "default_cooldown_sec")]
    pub cooldown_sec: f64,
    /// Static false-positive rectangles (x1, y1, x2, y2)
    #[serde(default = "default_exclusion_zones")]
    pub exclusion_zones: Vec<[f64; 4]>,
    /// Hit-point algorithm tunables
    #[serde(default)]
    pub hit: HitConfig,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: None,
            idle_sec: default_idle_sec(),
            cooldown_sec: default_cooldown_sec(),
            exclusion_zones: default_exclusion_zones(),
            hit: HitConfig::default(),
        }
    }
}

impl TrackingConfig {
    /// Trajectory buffer capacity (oldest samples evicted on overflow).
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity.unwrap_or(match self.hit.strategy {
            HitStrategy::Refined => 50,
            HitStrategy::Basic => 10,
        })
    }

    /// Override the buffer capacity.
    pub fn with_buffer_capacity(mut self, v: usize) -> Self {
        self.buffer_capacity = Some(v);
        self
    }

    /// Override the idle threshold.
    pub fn with_idle_sec(mut self, v: f64) -> Self {
        self.idle_sec = v;
        self
    }

    /// Override the cooldown duration.
    pub fn with_cooldown_sec(mut self, v: f64) -> Self {
        self.cooldown_sec = v;
        self
    }

    /// Replace the exclusion-zone list.
    pub fn with_exclusion_zones(mut self, zones: Vec<[f64; 4]>) -> Self {
        self.exclusion_zones = zones;
        self
    }

    /// Replace the hit tunables.
    pub fn with_hit(mut self, hit: HitConfig) -> Self {
        self.hit = hit;
        self
    }
}

/// One configured camera and its channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Operator-assigned camera identifier
    pub id: String,
    /// Pub/sub channel carrying arrow detections
    pub arrow_channel: String,
    /// Pub/sub channel carrying person detections
    #[serde(default)]
    pub person_channel: Option<String>,
    /// Request/reply channel of the target configuration service
    #[serde(default)]
    pub target_channel: Option<String>,
    /// Camera-specific exclusion zones, overriding the server-wide list
    #[serde(default)]
    pub exclusion_zones: Option<Vec<[f64; 4]>>,
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server-wide tracking defaults
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// Camera topology
    pub cameras: Vec<CameraConfig>,
}

impl ServerConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ServerConfig = serde_json::from_str(&raw)?;
        if config.cameras.is_empty() {
            return Err(BowError::Config("no cameras configured".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for cam in &config.cameras {
            if !seen.insert(cam.id.as_str()) {
                return Err(BowError::Config(format!("duplicate camera id: {}", cam.id)));
            }
        }
        Ok(config)
    }

    /// Tracking config for one camera: server-wide defaults with the
    /// camera's exclusion-zone override applied.
    pub fn tracking_for(&self, camera: &CameraConfig) -> TrackingConfig {
        let mut tracking = self.tracking.clone();
        if let Some(zones) = &camera.exclusion_zones {
            tracking.exclusion_zones = zones.clone();
        }
        tracking
    }
}
