//! By-type task resolution - the capability trait and the map-backed registry

use crate::core::task::{SharedTask, Task};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Capability the executor consults to resolve by-type steps.
///
/// The core depends only on this trait, never on a concrete container.
/// Implementations own instance-lifetime semantics entirely; the executor
/// only ever asks "an instance of this type, or nothing".
pub trait TaskResolver<C>: Send + Sync {
    fn resolve(&self, id: TypeId) -> Option<SharedTask<C>>;
}

/// Map-backed [`TaskResolver`].
///
/// [`register`] hands out a fresh instance on every resolve (transient
/// lifetime); [`register_shared`] hands out clones of a single `Arc`, so
/// every run sees the same instance. This is where constructor-injected
/// dependencies enter: the registration closure captures them.
///
/// [`register`]: TaskRegistry::register
/// [`register_shared`]: TaskRegistry::register_shared
pub struct TaskRegistry<C> {
    entries: HashMap<TypeId, Arc<dyn Fn() -> SharedTask<C> + Send + Sync>>,
}

impl<C: 'static> TaskRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a factory producing a fresh `T` per resolve.
    pub fn register<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Task<C> + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.entries.insert(
            TypeId::of::<T>(),
            Arc::new(move || Arc::new(factory()) as SharedTask<C>),
        );
        self
    }

    /// Register one instance of `T`, shared by every resolve.
    pub fn register_shared<T>(&mut self, task: T) -> &mut Self
    where
        T: Task<C> + 'static,
    {
        let shared: SharedTask<C> = Arc::new(task);
        self.entries
            .insert(TypeId::of::<T>(), Arc::new(move || Arc::clone(&shared)));
        self
    }

    /// Number of registered task types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: 'static> Default for TaskRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> TaskResolver<C> for TaskRegistry<C> {
    fn resolve(&self, id: TypeId) -> Option<SharedTask<C>> {
        let entry = self.entries.get(&id)?;
        debug!(?id, "resolved task from registry");
        Some(entry())
    }
}
