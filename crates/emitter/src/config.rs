//! Emitter configuration.

use lineage_core::{DEFAULT_NAMESPACE, DEFAULT_PRODUCER};
use serde::{Deserialize, Serialize};

use crate::error::LineageError;

/// How task callbacks are mapped onto lineage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Every task is its own job with its own run.
    #[default]
    Task,
    /// Tasks report `RUNNING` events under the pipeline run.
    Pipeline,
}

/// Emitter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Namespace stamped on every job and dataset
    pub namespace: String,

    /// Producer identity carried in every event
    pub producer: String,

    /// Task-to-run mapping
    pub granularity: Granularity,

    /// Force-release tasks still in flight when the pipeline run finishes
    pub sweep_on_finish: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            producer: DEFAULT_PRODUCER.to_string(),
            granularity: Granularity::Task,
            sweep_on_finish: false,
        }
    }
}

impl EmitterConfig {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (keyed by env variable name) on the defaults.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(namespace) = lookup("LINEAGE_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(producer) = lookup("LINEAGE_PRODUCER") {
            config.producer = producer;
        }
        if let Some(granularity) = lookup("LINEAGE_GRANULARITY") {
            config.granularity = match granularity.to_lowercase().as_str() {
                "task" => Granularity::Task,
                "pipeline" => Granularity::Pipeline,
                other => {
                    tracing::warn!(
                        value = other,
                        "unknown LINEAGE_GRANULARITY, falling back to task"
                    );
                    Granularity::Task
                }
            };
        }
        if let Some(sweep) = lookup("LINEAGE_SWEEP_ON_FINISH") {
            config.sweep_on_finish = matches!(sweep.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Check the configuration can produce well-formed events.
    pub fn validate(&self) -> Result<(), LineageError> {
        if self.namespace.trim().is_empty() {
            return Err(LineageError::Config("namespace must not be empty".into()));
        }
        if self.producer.trim().is_empty() {
            return Err(LineageError::Config("producer must not be empty".into()));
        }
        Ok(())
    }
}
