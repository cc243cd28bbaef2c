//! Logging setup for the binary
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever runs it. `RUST_LOG` wins when set.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub const fn default_filter(verbose: bool) -> &'static str {
    if verbose { "warn,fanout=debug" } else { "warn,fanout=info" }
}

/// Install a stderr `fmt` subscriber
///
/// Does nothing if a global subscriber is already set.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
