//! Arrow tracking for one camera.
//!
//! Three collaborating components:
//!
//! - **[`KalmanState`]** — constant-velocity 2-D centroid filter
//! - **[`ArrowTracker`]** — raw detection → stabilized tip/tail pair
//! - **[`TrackingState`]** — trajectory buffer, idle/cooldown timers,
//!   and the hit-point evaluation entry point
//!
//! The hit-point algorithm itself lives in [`hit`].

pub mod hit;
pub mod kalman;
pub mod state;
pub mod tracker;

pub use kalman::KalmanState;
pub use state::TrackingState;
pub use tracker::{ArrowTracker, TipTail};
