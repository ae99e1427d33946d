//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::TryInitError};

/// Directives applied when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVES: &str = "dashboard=info,services=info,models=info,utils=info";

/// Install a global fmt subscriber on stderr filtered by `RUST_LOG`, falling back to
/// `default_directives`.
pub fn init(default_directives: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
}
