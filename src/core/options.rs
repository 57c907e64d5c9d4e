//! Run options - error policy, lifecycle hooks, middleware registration

use crate::core::middleware::Middleware;
use crate::core::task::Task;
use async_trait::async_trait;
use std::sync::Arc;

/// What the executor does when a step's pipeline raises an error.
///
/// Cancellation and resolution errors are never subject to this policy; they
/// abort the run unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStrategy {
    /// Abort the run on the first failing step, re-raising its error.
    #[default]
    StopOnError,
    /// Swallow the failure after notifying the step-failed hook and move on
    /// to the next step.
    SkipFailed,
}

/// Lifecycle callback awaited before and after each step (the step-started
/// and step-completed slots).
///
/// Plain closures `Fn(&dyn Task<C>, &C) -> anyhow::Result<()>` implement this
/// trait through the blanket impl below; implement it by hand when the hook
/// needs to await. An error returned from a hook aborts the run regardless of
/// the configured [`ErrorStrategy`] - hooks are observability, not pipeline
/// logic.
#[async_trait]
pub trait StepHook<C>: Send + Sync {
    async fn call(&self, task: &dyn Task<C>, ctx: &C) -> anyhow::Result<()>;
}

#[async_trait]
impl<C, F> StepHook<C> for F
where
    C: Send + Sync,
    F: Fn(&dyn Task<C>, &C) -> anyhow::Result<()> + Send + Sync,
{
    async fn call(&self, task: &dyn Task<C>, ctx: &C) -> anyhow::Result<()> {
        (self)(task, ctx)
    }
}

/// Lifecycle callback awaited when a step fails, before the error strategy is
/// applied. Receives the error the step's pipeline raised.
#[async_trait]
pub trait StepFailedHook<C>: Send + Sync {
    async fn call(&self, task: &dyn Task<C>, error: &anyhow::Error, ctx: &C)
        -> anyhow::Result<()>;
}

#[async_trait]
impl<C, F> StepFailedHook<C> for F
where
    C: Send + Sync,
    F: Fn(&dyn Task<C>, &anyhow::Error, &C) -> anyhow::Result<()> + Send + Sync,
{
    async fn call(
        &self,
        task: &dyn Task<C>,
        error: &anyhow::Error,
        ctx: &C,
    ) -> anyhow::Result<()> {
        (self)(task, error, ctx)
    }
}

/// Configuration captured by [`PipelineBuilder::build`]: the error-handling
/// strategy, three optional lifecycle hooks, and the ordered middleware list.
///
/// Mutable through [`PipelineBuilder::configure`] until build; the executor
/// never mutates it afterwards.
///
/// [`PipelineBuilder::build`]: crate::execution::builder::PipelineBuilder::build
/// [`PipelineBuilder::configure`]: crate::execution::builder::PipelineBuilder::configure
pub struct PipelineOptions<C> {
    /// Policy applied to step failures.
    pub error_strategy: ErrorStrategy,
    pub(crate) on_step_started: Option<Arc<dyn StepHook<C>>>,
    pub(crate) on_step_completed: Option<Arc<dyn StepHook<C>>>,
    pub(crate) on_step_failed: Option<Arc<dyn StepFailedHook<C>>>,
    pub(crate) middlewares: Vec<Arc<dyn Middleware<C>>>,
}

impl<C> PipelineOptions<C> {
    /// Set the hook awaited just before each step executes.
    pub fn on_step_started(&mut self, hook: impl StepHook<C> + 'static) -> &mut Self {
        self.on_step_started = Some(Arc::new(hook));
        self
    }

    /// Set the hook awaited after each step completes successfully.
    pub fn on_step_completed(&mut self, hook: impl StepHook<C> + 'static) -> &mut Self {
        self.on_step_completed = Some(Arc::new(hook));
        self
    }

    /// Set the hook awaited when a step fails, before the error strategy is
    /// applied.
    pub fn on_step_failed(&mut self, hook: impl StepFailedHook<C> + 'static) -> &mut Self {
        self.on_step_failed = Some(Arc::new(hook));
        self
    }

    /// Append a middleware to the chain. Registration order is invocation
    /// order: the first registered middleware is the outermost wrapper.
    pub fn wrap(&mut self, middleware: impl Middleware<C> + 'static) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }
}

impl<C> Default for PipelineOptions<C> {
    fn default() -> Self {
        Self {
            error_strategy: ErrorStrategy::default(),
            on_step_started: None,
            on_step_completed: None,
            on_step_failed: None,
            middlewares: Vec::new(),
        }
    }
}

// Manual impl: hooks and middleware are Arc-shared, so options clone cheaply
// without requiring C: Clone.
impl<C> Clone for PipelineOptions<C> {
    fn clone(&self) -> Self {
        Self {
            error_strategy: self.error_strategy,
            on_step_started: self.on_step_started.clone(),
            on_step_completed: self.on_step_completed.clone(),
            on_step_failed: self.on_step_failed.clone(),
            middlewares: self.middlewares.clone(),
        }
    }
}
