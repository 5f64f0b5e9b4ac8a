//! # Task abstractions and specifications.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for implementing async cancelable work
//! - [`TaskFn`], [`BlockingFn`] - closure-based work
//! - [`TaskRef`] - shared reference to work (`Arc<dyn Task>`)
//! - [`TaskSpec`] - descriptor bundling work with delay, retries and callbacks
//! - [`TimeUnit`] - unit of the delay

mod spec;
mod spec_builder;
mod task;
mod task_fn;
mod unit;

pub(crate) use spec::TaskDescriptor;
pub use spec::{Callback, TaskSpec};
pub use spec_builder::TaskSpecBuilder;
pub use task::{Task, TaskRef};
pub use task_fn::{BlockingFn, TaskFn};
pub use unit::TimeUnit;
