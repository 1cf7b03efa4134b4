//! Logging utilities
//!
//! The library only emits through the `log` facade; binaries decide whether to
//! install `env_logger`.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize logging with a default level that `RUST_LOG` can override
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
