//! Task abstraction - named units of work over a shared context

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A named, asynchronous unit of work operating on a shared context.
///
/// Failure is signalled through the returned `Result`; every other effect
/// goes through mutation of the context. The executor hands the context out
/// by shared reference, so a task that writes to it does so through interior
/// mutability owned by the context type. The executor performs no locking of
/// its own - tasks that run concurrently inside a [`ParallelGroup`] and touch
/// the same context field must synchronize themselves.
///
/// [`ParallelGroup`]: crate::core::group::ParallelGroup
#[async_trait]
pub trait Task<C>: Send + Sync {
    /// Human-readable task name. Stable across runs, not required to be
    /// unique within a pipeline.
    fn name(&self) -> &str;

    /// Run the task against the shared context.
    ///
    /// The token is the run-wide cancellation token; long-running tasks
    /// should poll it for mid-step responsiveness. The executor itself only
    /// checks it at step boundaries.
    async fn execute(&self, ctx: &C, cancel: &CancellationToken) -> anyhow::Result<()>;
}

/// Shared handle to a task. One registered instance may serve many runs.
pub type SharedTask<C> = Arc<dyn Task<C>>;

/// Placeholder task substituted when a step's skip predicate gates it out.
///
/// Executes as an immediate success, so skipped steps stay visible to hooks
/// and middleware under their "Skipped ..." name instead of vanishing from
/// the trace.
pub struct NoopTask {
    name: String,
}

impl NoopTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl<C: Send + Sync> Task<C> for NoopTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &C, _cancel: &CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
}
