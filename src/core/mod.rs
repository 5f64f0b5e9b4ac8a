//! Runtime core: scheduling, timers and the task registry.
//!
//! The public API from this module is [`Scheduler`] (with its builder and
//! config) plus the read-only [`TaskInfo`]/[`TaskState`] snapshot types.
//!
//! Internal modules:
//! - [`scheduler`]: public API, feature gates, arming of timers;
//! - [`runner`]: runs one attempt (delay, work, finalize or retry);
//! - [`registry`]: id → live handle, generation-guarded transitions;
//! - [`state`]: lifecycle state machine;
//! - [`builder`]: wires bus, subscribers and gate into a scheduler.

mod builder;
mod config;
mod registry;
mod runner;
mod scheduler;
mod state;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use scheduler::Scheduler;
pub use state::{TaskInfo, TaskState};

use std::any::Any;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
