//! Logging setup for the `cfgtool` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the program embedding it.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// How much the binary logs when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Failed operations only
    Quiet,
    /// Every resolved operation
    Debug,
}

impl Verbosity {
    fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "cfgtree=warn",
            Verbosity::Debug => "cfgtree=debug",
        }
    }
}

/// Install a stderr subscriber. Later calls are no-ops.
pub fn init(verbosity: Verbosity) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));
        // Another subscriber may already be installed by an embedding program
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
