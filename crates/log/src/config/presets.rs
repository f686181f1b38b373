//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Format};
use crate::error::{LogError, LogResult};

impl Config {
    /// Create configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Config`] if `LINEAGE_LOG_FORMAT` names an unknown format
    pub fn from_env() -> LogResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LogResult<Self> {
        let mut config = Self::default();

        // LINEAGE_LOG wins over RUST_LOG
        if let Some(level) = lookup("LINEAGE_LOG").or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        if let Some(format) = lookup("LINEAGE_LOG_FORMAT") {
            config.format = format
                .parse()
                .map_err(|e| LogError::Config(format!("LINEAGE_LOG_FORMAT: {e}")))?;
        }

        if lookup("NO_COLOR").is_some() {
            config.display.colors = false;
        }

        config.service = lookup("LINEAGE_SERVICE");
        Ok(config)
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Test configuration (no colors, no timestamps)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }
}
