//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt layer. `RUST_LOG` wins over the
//! configured filter, e.g. `RUST_LOG=tessel_bridge=trace` shows every
//! applied instruction.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// Safe to call more than once; returns false when a subscriber was
/// already set (by an earlier call or by the embedding program).
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .try_init()
        .is_ok()
}
