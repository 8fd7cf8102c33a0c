//! Process-wide tracing subscriber setup.
//!
//! Installed once at process start. Defaults to `info`, overridable via
//! `RUST_LOG` or an explicit level string from the CLI.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` fmt subscriber as the global default.
///
/// `level_override` takes precedence over `RUST_LOG` when set (e.g. from
/// `--log-level`); absent both, defaults to `info`.
pub fn init(level_override: Option<&str>) -> Result<()> {
    let filter = match level_override {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level: {level}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
