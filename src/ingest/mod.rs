//! Detection ingestion over local pub/sub channels.
//!
//! The inference process publishes JSON detection events on one ZeroMQ
//! IPC channel per camera per source; [`subscriber`] runs one blocking
//! SUB loop per channel. [`bootstrap`] fetches the scoring polygon from
//! the configuration service once per camera at startup.

pub mod bootstrap;
pub mod subscriber;

/// IPC endpoint for a named channel.
pub(crate) fn ipc_endpoint(channel: &str) -> String {
    format!("ipc:///tmp/{channel}.ipc")
}
