//! Log output for processes embedding the bridge
//!
//! The library itself only emits `tracing` events: provisioning decisions
//! under `bridge_core::provision`, pushes and reads under `bridge_core::sync`.
//! Hosts that already install a subscriber need nothing from this module.
//! Hosts that don't can call [`init`] once at startup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install a compact subscriber filtered by `RUST_LOG`
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_with_default(DEFAULT_DIRECTIVE)
}

/// Like [`init`], falling back to `directive` (e.g. `"bridge_core=debug"`)
/// when `RUST_LOG` is unset
///
/// Fails if the directive does not parse or a global subscriber is already
/// installed.
pub fn init_with_default(directive: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(true).with_thread_ids(true))
        .try_init()?;

    Ok(())
}
