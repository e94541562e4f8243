//! Log backend installation.
//!
//! The engine logs through the `log` facade everywhere. Embedders that already
//! install a logger get the engine's records for free; hosts that have none
//! can install an `env_logger` backend once at startup. `RUST_LOG` takes
//! precedence over the level passed in.

use crate::config::{self, LogLevel};

/// Installs an `env_logger` backend at `level`.
///
/// Returns false when a logger was already installed by anyone.
pub fn init(level: LogLevel) -> bool {
    let installed = env_logger::Builder::new()
        .filter_level(level.as_filter())
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()
        .is_ok();
    if installed {
        log::debug!("logging initialised at {:?}", level);
    }
    installed
}

/// Installs a backend at the level of the current engine configuration.
pub fn init_from_config() -> bool {
    init(config::current().log_level)
}
