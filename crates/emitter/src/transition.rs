//! State machine transition validation for pipeline runs.

use crate::error::LineageError;
use crate::status::RunStatus;

/// Returns `true` if the pipeline-run transition from `from` to `to` is valid.
///
/// A finished run may be followed by a new one on the same controller.
#[must_use]
pub fn can_transition(from: RunStatus, to: RunStatus) -> bool {
    matches!(
        (from, to),
        (RunStatus::Idle, RunStatus::Running)
            | (RunStatus::Running, RunStatus::Completed)
            | (RunStatus::Running, RunStatus::Failed)
            | (RunStatus::Completed, RunStatus::Running)
            | (RunStatus::Failed, RunStatus::Running)
    )
}

/// Validate a pipeline-run transition, returning an error if invalid.
pub fn validate_transition(from: RunStatus, to: RunStatus) -> Result<(), LineageError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(LineageError::InvalidTransition { from, to })
    }
}
