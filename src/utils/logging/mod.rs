//! Logging setup
//!
//! Installs a `tracing_subscriber` formatter driven by [`LoggingConfig`].
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Returns `false` if a subscriber was already installed (for example by a test
/// harness); the existing subscriber is left untouched.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.is_ok()
}
