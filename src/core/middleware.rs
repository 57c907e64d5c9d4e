//! Middleware - wrappers composed around each task invocation

use crate::core::task::Task;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A wrapper invoked around a task's execution.
///
/// Middleware compose first-registered-outermost: the first middleware handed
/// to [`PipelineOptions::wrap`] sees the call before every other, and the
/// task body is the innermost link of the chain. A middleware decides whether
/// to call [`Next::run`] - not calling it suppresses the task body (and the
/// rest of the chain) for that step, and calling it more than once re-drives
/// the inner chain, which is how a retry middleware is written.
///
/// [`PipelineOptions::wrap`]: crate::core::options::PipelineOptions::wrap
#[async_trait]
pub trait Middleware<C>: Send + Sync {
    async fn handle(
        &self,
        task: &dyn Task<C>,
        ctx: &C,
        next: Next<'_, C>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}

/// Continuation over the remaining middleware chain, ending at the task body.
pub struct Next<'a, C> {
    task: &'a dyn Task<C>,
    chain: &'a [Arc<dyn Middleware<C>>],
}

// Next only holds references, so it is copyable regardless of C. This is
// what lets a middleware invoke the inner chain more than once.
impl<C> Clone for Next<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Next<'_, C> {}

impl<'a, C: Send + Sync> Next<'a, C> {
    pub(crate) fn new(task: &'a dyn Task<C>, chain: &'a [Arc<dyn Middleware<C>>]) -> Self {
        Self { task, chain }
    }

    /// Invoke the rest of the chain, ending with the task itself.
    pub fn run(
        self,
        ctx: &'a C,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            match self.chain.split_first() {
                Some((outer, rest)) => {
                    outer
                        .handle(self.task, ctx, Next::new(self.task, rest), cancel)
                        .await
                }
                None => self.task.execute(ctx, cancel).await,
            }
        })
    }
}
