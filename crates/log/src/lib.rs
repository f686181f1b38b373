#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Lineage Log
//!
//! Structured logging setup for the lineage emitter, built on `tracing`.
//!
//! ```no_run
//! let _guard = lineage_log::auto_init()?;
//! tracing::info!(pipeline = "daily", "lineage emitter ready");
//! # Ok::<(), lineage_log::LogError>(())
//! ```
//!
//! Environment:
//! - `LINEAGE_LOG` / `RUST_LOG`: filter directives
//! - `LINEAGE_LOG_FORMAT`: `pretty`, `compact` or `json`
//! - `LINEAGE_SERVICE`: service name recorded on a root span
//! - `NO_COLOR`: disables ANSI colors

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format};
pub use error::{LogError, LogResult};

/// Initialize with the default configuration
///
/// # Errors
///
/// Returns error if a global subscriber is already installed
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with a custom configuration
///
/// # Errors
///
/// Returns error if the filter is invalid or a global subscriber is already installed
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Pick a configuration from the environment and build profile
///
/// Uses [`Config::from_env`] when `LINEAGE_LOG` or `RUST_LOG` is set, otherwise
/// [`Config::development`] in debug builds and [`Config::production`] in release.
/// Leaves an already-installed subscriber in place.
///
/// # Errors
///
/// Returns error if the filter or format taken from the environment is invalid
pub fn auto_init() -> LogResult<LoggerGuard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggerGuard::noop());
    }

    let config = if std::env::var_os("LINEAGE_LOG").is_some()
        || std::env::var_os("RUST_LOG").is_some()
    {
        Config::from_env()?
    } else if cfg!(debug_assertions) {
        Config::development()
    } else {
        Config::production()
    };

    init_with(config)
}
