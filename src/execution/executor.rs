//! The executor - drives a built pipeline end to end

use crate::core::middleware::Next;
use crate::core::options::{ErrorStrategy, PipelineOptions};
use crate::core::resolver::TaskResolver;
use crate::core::task::Task;
use crate::error::PipelineError;
use crate::execution::builder::StepFactory;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Immutable executor produced by [`PipelineBuilder::build`].
///
/// Holds the resolved step factories, the frozen options, and the optional
/// external resolver. One executor may be run any number of times; each run
/// is an independent execution over its own context, and concurrent runs
/// over distinct contexts are safe - there is no internal run lock. Two
/// concurrent runs sharing one context are only as safe as the context's own
/// synchronization makes them.
///
/// [`PipelineBuilder::build`]: crate::execution::builder::PipelineBuilder::build
pub struct Pipeline<C> {
    factories: Vec<StepFactory<C>>,
    options: PipelineOptions<C>,
    resolver: Option<Arc<dyn TaskResolver<C>>>,
}

impl<C: Send + Sync> Pipeline<C> {
    pub(crate) fn new(
        factories: Vec<StepFactory<C>>,
        options: PipelineOptions<C>,
        resolver: Option<Arc<dyn TaskResolver<C>>>,
    ) -> Self {
        Self {
            factories,
            options,
            resolver,
        }
    }

    /// Number of registered steps.
    pub fn step_count(&self) -> usize {
        self.factories.len()
    }

    /// Run the pipeline with a token that is never cancelled.
    pub async fn run(&self, ctx: &C) -> anyhow::Result<()> {
        self.run_cancellable(ctx, CancellationToken::new()).await
    }

    /// Run the pipeline, checking `cancel` at every step boundary.
    ///
    /// Steps run strictly in registration order. Each step is materialized
    /// from its factory, announced through the step-started hook, driven
    /// through the middleware chain down to the task body, then closed out
    /// through the step-completed or step-failed hook. Task and middleware
    /// errors honor [`ErrorStrategy`]; under `StopOnError` the caller
    /// receives the failing step's original error. Cancellation and
    /// resolution errors, and errors raised by hooks themselves, abort the
    /// run regardless of the strategy.
    pub async fn run_cancellable(&self, ctx: &C, cancel: CancellationToken) -> anyhow::Result<()> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, steps = self.factories.len());

        async {
            for (index, factory) in self.factories.iter().enumerate() {
                if cancel.is_cancelled() {
                    warn!(step = index, "run cancelled at step boundary");
                    return Err(PipelineError::Cancelled { index }.into());
                }

                let task = factory(self.resolver.as_deref(), ctx)?;
                self.run_step(index, task.as_ref(), ctx, &cancel).await?;
            }

            debug!("pipeline run complete");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn run_step(
        &self,
        index: usize,
        task: &dyn Task<C>,
        ctx: &C,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        debug!(step = index, task = task.name(), "step started");

        if let Some(hook) = &self.options.on_step_started {
            hook.call(task, ctx).await?;
        }

        let outcome = Next::new(task, &self.options.middlewares)
            .run(ctx, cancel)
            .await;

        match outcome {
            Ok(()) => {
                if let Some(hook) = &self.options.on_step_completed {
                    hook.call(task, ctx).await?;
                }
                debug!(step = index, task = task.name(), "step completed");
                Ok(())
            }
            Err(error) => {
                if let Some(hook) = &self.options.on_step_failed {
                    hook.call(task, &error, ctx).await?;
                }
                match self.options.error_strategy {
                    ErrorStrategy::StopOnError => Err(error),
                    ErrorStrategy::SkipFailed => {
                        warn!(step = index, task = task.name(), %error, "step failed, continuing");
                        Ok(())
                    }
                }
            }
        }
    }
}
