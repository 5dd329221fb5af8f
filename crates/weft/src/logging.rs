//! Log subscriber setup.
//!
//! The filter is read from `WEFT_LOG` using `EnvFilter` directive syntax
//! (`info`, `weft_sync=debug`, ...). When unset or invalid the level passed
//! to [`init`] is used, then `info`.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "WEFT_LOG";

/// Install a formatted subscriber for the process.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
