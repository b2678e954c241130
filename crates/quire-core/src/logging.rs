#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! Re-exports the `tracing` macros used throughout the workspace and offers
//! [`init_logging`] for hosts that want a formatted subscriber.

pub use tracing::{debug, debug_span, error, info, info_span, trace, trace_span, warn};

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Environment variable consulted before the configured default directive.
pub const LOG_ENV_VAR: &str = "QUIRE_LOG";

/// Install a global fmt subscriber.
///
/// The filter comes from `QUIRE_LOG` when set and valid, otherwise from
/// `config.default_directive`. Returns `false` if a global subscriber was
/// already installed (the existing one is kept).
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(&config.default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .is_ok()
}
