//! Pipeline builder - accumulates step factories, produces immutable executors

use crate::core::options::PipelineOptions;
use crate::core::resolver::TaskResolver;
use crate::core::task::{NoopTask, SharedTask, Task};
use crate::error::PipelineError;
use crate::execution::executor::Pipeline;
use std::any::{type_name, TypeId};
use std::sync::Arc;

/// Produces the task for one step of one run. Invoked once per run per step
/// with the executor's resolver and the run context.
pub(crate) type StepFactory<C> = Arc<
    dyn Fn(Option<&dyn TaskResolver<C>>, &C) -> Result<SharedTask<C>, PipelineError>
        + Send
        + Sync,
>;

type Predicate<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Accumulates step factories and options, then snapshots them into an
/// immutable [`Pipeline`].
///
/// The builder stays usable after [`build`]; executors already built hold
/// their own copies of the factory list and options, so later mutation never
/// reaches them.
///
/// [`build`]: PipelineBuilder::build
pub struct PipelineBuilder<C> {
    factories: Vec<StepFactory<C>>,
    options: PipelineOptions<C>,
    resolver: Option<Arc<dyn TaskResolver<C>>>,
}

impl<C: Send + Sync + 'static> PipelineBuilder<C> {
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            options: PipelineOptions::default(),
            resolver: None,
        }
    }

    /// Append a by-type step.
    ///
    /// Per run, the attached resolver is consulted first; a type without a
    /// resolver entry falls back to `T::default()`. Tasks whose construction
    /// needs injected dependencies belong in [`add_resolved_step`] instead.
    ///
    /// [`add_resolved_step`]: PipelineBuilder::add_resolved_step
    pub fn add_step<T>(self) -> Self
    where
        T: Task<C> + Default + 'static,
    {
        self.add_step_inner::<T>(None)
    }

    /// Append a by-type step gated by a predicate over the run context. A
    /// false predicate substitutes a no-op named "Skipped <task type>".
    pub fn add_step_if<T, P>(self, predicate: P) -> Self
    where
        T: Task<C> + Default + 'static,
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.add_step_inner::<T>(Some(Arc::new(predicate)))
    }

    /// Append a by-type step with no construction fallback: the task must be
    /// registered with the attached resolver. A missing entry surfaces as
    /// [`PipelineError::Unresolved`] when the run reaches the step.
    pub fn add_resolved_step<T>(self) -> Self
    where
        T: Task<C> + 'static,
    {
        self.add_resolved_step_inner::<T>(None)
    }

    /// Resolver-only variant of [`add_step_if`].
    ///
    /// [`add_step_if`]: PipelineBuilder::add_step_if
    pub fn add_resolved_step_if<T, P>(self, predicate: P) -> Self
    where
        T: Task<C> + 'static,
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.add_resolved_step_inner::<T>(Some(Arc::new(predicate)))
    }

    /// Append an instance step. The same handle is yielded on every run.
    pub fn add_task(self, task: impl Task<C> + 'static) -> Self {
        self.add_task_inner(Arc::new(task), None)
    }

    /// Append an instance step gated by a predicate over the run context. A
    /// false predicate substitutes a no-op named "Skipped <task name>".
    pub fn add_task_if<P>(self, task: impl Task<C> + 'static, predicate: P) -> Self
    where
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.add_task_inner(Arc::new(task), Some(Arc::new(predicate)))
    }

    /// Attach the resolver consulted for by-type steps. It is passed into
    /// every executor this builder produces.
    pub fn with_resolver(mut self, resolver: impl TaskResolver<C> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Apply a mutation to the options. Later calls may overwrite settings
    /// made by earlier ones.
    pub fn configure(mut self, mutate: impl FnOnce(&mut PipelineOptions<C>)) -> Self {
        mutate(&mut self.options);
        self
    }

    /// Snapshot the current factory list, options, and resolver into an
    /// executor.
    pub fn build(&self) -> Pipeline<C> {
        Pipeline::new(
            self.factories.clone(),
            self.options.clone(),
            self.resolver.clone(),
        )
    }

    fn add_step_inner<T>(mut self, predicate: Option<Predicate<C>>) -> Self
    where
        T: Task<C> + Default + 'static,
    {
        self.factories.push(Arc::new(move |resolver, ctx| {
            if skipped(&predicate, ctx) {
                return Ok(noop_for(short_type_name::<T>()));
            }
            if let Some(task) = resolver.and_then(|r| r.resolve(TypeId::of::<T>())) {
                return Ok(task);
            }
            Ok(Arc::new(T::default()) as SharedTask<C>)
        }));
        self
    }

    fn add_resolved_step_inner<T>(mut self, predicate: Option<Predicate<C>>) -> Self
    where
        T: Task<C> + 'static,
    {
        self.factories.push(Arc::new(move |resolver, ctx| {
            if skipped(&predicate, ctx) {
                return Ok(noop_for(short_type_name::<T>()));
            }
            resolver
                .and_then(|r| r.resolve(TypeId::of::<T>()))
                .ok_or(PipelineError::Unresolved {
                    type_name: type_name::<T>(),
                })
        }));
        self
    }

    fn add_task_inner(mut self, task: SharedTask<C>, predicate: Option<Predicate<C>>) -> Self {
        let skipped_name = format!("Skipped {}", task.name());
        self.factories.push(Arc::new(move |_resolver, ctx| {
            if skipped(&predicate, ctx) {
                return Ok(Arc::new(NoopTask::new(skipped_name.clone())) as SharedTask<C>);
            }
            Ok(Arc::clone(&task))
        }));
        self
    }
}

impl<C: Send + Sync + 'static> Default for PipelineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn skipped<C>(predicate: &Option<Predicate<C>>, ctx: &C) -> bool {
    predicate.as_ref().is_some_and(|predicate| !predicate(ctx))
}

fn noop_for<C: Send + Sync>(name: &str) -> SharedTask<C> {
    Arc::new(NoopTask::new(format!("Skipped {name}")))
}

/// Last path segment of a type name, the way it reads in source.
fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
