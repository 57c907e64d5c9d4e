//! Parallel group - fans member tasks out concurrently and joins them

use crate::core::task::{SharedTask, Task};
use anyhow::Context as _;
use async_trait::async_trait;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Composite task that runs its members concurrently against the same
/// context and cancellation token, then joins before the surrounding
/// pipeline proceeds.
///
/// Every member runs to completion: a failing member does not cancel its
/// siblings. Callers that want members torn down on failure propagate
/// cancellation through the shared token themselves. When one or more
/// members fail, the group fails with the first failed member in member
/// order, that member's name attached as error context (the member's
/// original error stays downcastable underneath).
pub struct ParallelGroup<C> {
    name: String,
    members: Vec<SharedTask<C>>,
}

impl<C> ParallelGroup<C> {
    pub fn new(name: impl Into<String>, members: Vec<SharedTask<C>>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Number of member tasks.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl<C: Send + Sync> Task<C> for ParallelGroup<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &C, cancel: &CancellationToken) -> anyhow::Result<()> {
        debug!(
            group = %self.name,
            members = self.members.len(),
            "joining parallel group"
        );

        let outcomes = join_all(
            self.members
                .iter()
                .map(|member| member.execute(ctx, cancel)),
        )
        .await;

        for (member, outcome) in self.members.iter().zip(outcomes) {
            outcome.with_context(|| format!("parallel member `{}` failed", member.name()))?;
        }

        Ok(())
    }
}
