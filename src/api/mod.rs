//! HTTP/WebSocket surface.
//!
//! ## Endpoints
//!
//! - `WS /ws/hit/:cam_id` — live hit feed for one camera (see [`ws`]
//!   for the protocol)
//! - `GET /healthz` — liveness probe

pub mod dto;
pub mod state;
pub mod ws;

use axum::routing::get;
use axum::{Json, Router};

pub use state::AppState;
pub use ws::LiveFeed;

/// Build the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/hit/:cam_id", get(ws::ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
