//! Logging setup
//!
//! Structured logs go to stderr so stdout stays clean for table and JSON
//! output. `RUST_LOG` controls the filter, defaulting to `warn`.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - store open and ETL outcomes
/// - `RUST_LOG=bestiary_core=debug` - cache hits and misses
pub fn init() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
}
