//! Test: middleware composition around task execution

use crate::helpers::*;
use conveyor::{Middleware, Next, PipelineBuilder, Task};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Records entry and exit around the rest of the chain.
struct TraceMiddleware {
    tag: &'static str,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Middleware<TestContext> for TraceMiddleware {
    async fn handle(
        &self,
        task: &dyn Task<TestContext>,
        ctx: &TestContext,
        next: Next<'_, TestContext>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        self.recorder
            .record(format!("{} before {}", self.tag, task.name()));
        let outcome = next.run(ctx, cancel).await;
        self.recorder
            .record(format!("{} after {}", self.tag, task.name()));
        outcome
    }
}

/// Swallows the step entirely by never calling the continuation.
struct ShortCircuit;

#[async_trait]
impl Middleware<TestContext> for ShortCircuit {
    async fn handle(
        &self,
        _task: &dyn Task<TestContext>,
        _ctx: &TestContext,
        _next: Next<'_, TestContext>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fails every step it wraps.
struct Poison;

#[async_trait]
impl Middleware<TestContext> for Poison {
    async fn handle(
        &self,
        _task: &dyn Task<TestContext>,
        _ctx: &TestContext,
        _next: Next<'_, TestContext>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        anyhow::bail!("poisoned")
    }
}

/// Re-drives the inner chain until it succeeds or attempts run out.
struct Retry {
    max_attempts: usize,
}

#[async_trait]
impl Middleware<TestContext> for Retry {
    async fn handle(
        &self,
        _task: &dyn Task<TestContext>,
        ctx: &TestContext,
        next: Next<'_, TestContext>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let mut last_error = None;
        for _ in 0..self.max_attempts {
            match next.run(ctx, cancel).await {
                Ok(()) => return Ok(()),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.expect("at least one attempt was made"))
    }
}

#[tokio::test]
async fn middleware_compose_first_registered_outermost() {
    let recorder = Arc::new(Recorder::default());
    let outer = TraceMiddleware {
        tag: "outer",
        recorder: Arc::clone(&recorder),
    };
    let inner = TraceMiddleware {
        tag: "inner",
        recorder: Arc::clone(&recorder),
    };

    let pipeline = PipelineBuilder::new()
        .add_task(AppendTask::new("Body"))
        .configure(move |opts| {
            opts.wrap(outer);
            opts.wrap(inner);
        })
        .build();

    let ctx = TestContext::new();
    pipeline.run(&ctx).await.unwrap();

    assert_eq!(
        recorder.events(),
        [
            "outer before Append(Body)",
            "inner before Append(Body)",
            "inner after Append(Body)",
            "outer after Append(Body)",
        ]
    );
    assert_eq!(ctx.log(), ["Body"]);
}

#[tokio::test]
async fn short_circuiting_middleware_suppresses_the_task_body() {
    let recorder = Arc::new(Recorder::default());
    let completed = Arc::clone(&recorder);

    let pipeline = PipelineBuilder::new()
        .add_task(AppendTask::new("Body"))
        .configure(move |opts| {
            opts.wrap(ShortCircuit);
            opts.on_step_completed(move |task: &dyn Task<TestContext>, _: &TestContext| {
                completed.record(task.name().to_string());
                Ok(())
            });
        })
        .build();

    let ctx = TestContext::new();
    pipeline.run(&ctx).await.unwrap();

    // The step still completes from the executor's point of view.
    assert!(ctx.log().is_empty());
    assert_eq!(recorder.events(), ["Append(Body)"]);
}

#[tokio::test]
async fn middleware_errors_are_step_failures() {
    let recorder = Arc::new(Recorder::default());
    let failures = Arc::clone(&recorder);

    let pipeline = PipelineBuilder::new()
        .add_task(AppendTask::new("Body"))
        .configure(move |opts| {
            opts.wrap(Poison);
            opts.on_step_failed(
                move |task: &dyn Task<TestContext>, error: &anyhow::Error, _: &TestContext| {
                    failures.record(format!("{}: {error}", task.name()));
                    Ok(())
                },
            );
        })
        .build();

    let ctx = TestContext::new();
    let error = pipeline.run(&ctx).await.unwrap_err();

    assert!(error.to_string().contains("poisoned"));
    assert!(ctx.log().is_empty());
    assert_eq!(recorder.events(), ["Append(Body): poisoned"]);
}

#[tokio::test]
async fn retry_middleware_recovers_a_flaky_task() {
    let pipeline = PipelineBuilder::new()
        .add_task(FlakyTask::failing(2))
        .configure(|opts| {
            opts.wrap(Retry { max_attempts: 3 });
        })
        .build();

    let ctx = TestContext::new();
    pipeline.run(&ctx).await.unwrap();

    assert_eq!(ctx.log(), ["Flaky"]);
}

#[tokio::test]
async fn retry_middleware_gives_up_after_max_attempts() {
    let pipeline = PipelineBuilder::new()
        .add_task(FlakyTask::failing(5))
        .configure(|opts| {
            opts.wrap(Retry { max_attempts: 3 });
        })
        .build();

    let ctx = TestContext::new();
    let error = pipeline.run(&ctx).await.unwrap_err();

    assert!(error.to_string().contains("flaky"));
    assert!(ctx.log().is_empty());
}
