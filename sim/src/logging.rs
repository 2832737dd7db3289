//! Tracing subscriber setup for binaries and demos embedding the simulator.

use tracing::subscriber::SetGlobalDefaultError;
use tracing::{info, Level};

/// Install a compact stdout subscriber as the global default.
///
/// Fails if another global subscriber is already installed.
pub fn init_logging(max_level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    info!(%max_level, "logging initialised");
    Ok(())
}
