//! Emitter error types.

use lineage_core::{EventKind, RunId};
use thiserror::Error;

use crate::sink::SinkError;
use crate::status::RunStatus;

/// Errors surfaced to the caller of a lifecycle callback.
///
/// None of these are logged and swallowed inside the emitter; each one means
/// lineage for the current run is incomplete or was never delivered.
#[derive(Debug, Error)]
pub enum LineageError {
    /// A task start arrived while the same task name is still in flight.
    #[error("task already in flight: {task}")]
    DuplicateTask {
        /// The task name.
        task: String,
    },

    /// A task end arrived without a matching task start.
    #[error("no in-flight task named {task}")]
    UnknownTask {
        /// The task name.
        task: String,
    },

    /// The sink failed to accept an event.
    #[error("failed to emit {kind} event for run {run_id}: {source}")]
    Emission {
        /// Kind of the undelivered event.
        kind: EventKind,
        /// Run the undelivered event belongs to.
        run_id: RunId,
        /// The sink's error.
        #[source]
        source: SinkError,
    },

    /// A pipeline callback is not valid for the current run status.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: RunStatus,
        /// Attempted target status.
        to: RunStatus,
    },

    /// A task callback needs a running pipeline but none is active.
    #[error("no pipeline run is active")]
    NoActiveRun,

    /// The emitter configuration is unusable.
    #[error("config: {0}")]
    Config(String),
}

impl LineageError {
    /// Whether the error comes from task start/end bookkeeping.
    #[must_use]
    pub fn is_correlation_error(&self) -> bool {
        matches!(self, Self::DuplicateTask { .. } | Self::UnknownTask { .. })
    }

    /// Whether the error comes from the sink.
    #[must_use]
    pub fn is_emission_error(&self) -> bool {
        matches!(self, Self::Emission { .. })
    }
}

/// Result type used throughout the emitter.
pub type Result<T> = std::result::Result<T, LineageError>;
