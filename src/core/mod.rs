//! Core domain models for conveyor
//!
//! This module defines the task abstraction, the parallel group, and the
//! configuration surface (options, hooks, middleware, resolver) that the
//! execution layer is built on.

pub mod group;
pub mod middleware;
pub mod options;
pub mod resolver;
pub mod task;

pub use group::ParallelGroup;
pub use middleware::{Middleware, Next};
pub use options::{ErrorStrategy, PipelineOptions, StepFailedHook, StepHook};
pub use resolver::{TaskRegistry, TaskResolver};
pub use task::{NoopTask, SharedTask, Task};
