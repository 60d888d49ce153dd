//! SmartBow server binary.
//!
//! Wires the pieces together: camera registry from configuration, one
//! detection subscriber per camera per source, target bootstrap threads,
//! the background detector loop, and the axum server carrying the live
//! viewer feed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info};

use smartbow::api::{self, AppState, LiveFeed};
use smartbow::detect::DetectorLoop;
use smartbow::frame::FrameStore;
use smartbow::ingest::{bootstrap, subscriber};
use smartbow::{CameraRegistry, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "smartbow", about = "Arrow tracking and hit detection server")]
struct Args {
    /// Path to the server configuration file
    #[arg(long, default_value = "smartbow.json")]
    config: PathBuf,

    /// HTTP/WebSocket listen port
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Detector poll interval in milliseconds
    #[arg(long, default_value = "100")]
    poll_ms: u64,

    /// Directory for debug hit snapshots (disabled when unset)
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match ServerConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(CameraRegistry::from_config(&config));
    let frames = Arc::new(FrameStore::new());
    let (hits_tx, hits_rx) = broadcast::channel(64);

    info!(cameras = registry.len(), "starting detection services");
    for cam in &config.cameras {
        subscriber::spawn_subscriber(registry.clone(), cam.id.clone(), cam.arrow_channel.clone());
        if let Some(channel) = &cam.person_channel {
            subscriber::spawn_subscriber(registry.clone(), cam.id.clone(), channel.clone());
        }
        if let Some(channel) = &cam.target_channel {
            bootstrap::spawn_target_bootstrap(registry.clone(), cam.id.clone(), channel.clone());
        }
    }

    let mut detector = DetectorLoop::new(registry.clone(), frames.clone(), hits_tx.clone())
        .with_poll_interval(Duration::from_millis(args.poll_ms));
    if let Some(dir) = args.snapshot_dir {
        detector = detector.with_snapshot_dir(dir);
    }
    tokio::spawn(detector.run());

    let feed = Arc::new(LiveFeed::new());
    tokio::spawn(api::ws::run_feed(feed.clone(), registry.clone(), hits_rx));

    let app = api::create_router(AppState::new(registry, feed));
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind listener");
            std::process::exit(1);
        }
    };
    info!(%addr, "smartbow server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server terminated");
    }
}
