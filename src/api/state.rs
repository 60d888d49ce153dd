//! Shared application state for the API.

use std::sync::Arc;

use crate::registry::CameraRegistry;

use super::ws::LiveFeed;

/// Cloned into every handler; all shared resources live behind one Arc.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    registry: Arc<CameraRegistry>,
    feed: Arc<LiveFeed>,
}

impl AppState {
    /// Bundle the registry and live feed for the router.
    pub fn new(registry: Arc<CameraRegistry>, feed: Arc<LiveFeed>) -> Self {
        Self { inner: Arc::new(AppStateInner { registry, feed }) }
    }

    /// The camera registry.
    pub fn registry(&self) -> &Arc<CameraRegistry> {
        &self.inner.registry
    }

    /// The viewer session set.
    pub fn feed(&self) -> &Arc<LiveFeed> {
        &self.inner.feed
    }
}
