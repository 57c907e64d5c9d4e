//! Executor error type

use thiserror::Error;

/// Errors raised by the executor itself, as opposed to failures returned by
/// tasks or middleware.
///
/// Both variants bypass the configured error strategy: they propagate out of
/// the run immediately and the step-failed hook does not fire for them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The cancellation token was already signalled at a step boundary.
    #[error("pipeline run cancelled before step {index}")]
    Cancelled {
        /// Zero-based position of the step that was about to run.
        index: usize,
    },

    /// A resolver-only step had no entry in the attached resolver.
    #[error("no resolver entry for task type `{type_name}`")]
    Unresolved {
        /// Type name of the task that could not be resolved.
        type_name: &'static str,
    },
}
