//! Pipeline construction and execution

pub mod builder;
pub mod executor;

pub use builder::PipelineBuilder;
pub use executor::Pipeline;
