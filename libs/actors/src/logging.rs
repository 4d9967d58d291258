//! Tracing setup for processes embedding actors
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`init_tracing`] once; tests call [`init_test_tracing`] as often as they
//! like.

use crate::error::{ActorError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` (e.g. `"info"` or `"messaging_actors=debug,warn"`)
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| ActorError::configuration(format!("Failed to initialize tracing: {}", e), None))
}

/// Route events to the test harness output; later calls are no-ops
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "messaging_actors=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
