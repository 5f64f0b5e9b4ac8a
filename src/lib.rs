//! # taskdefer
//!
//! **Taskdefer** is an in-memory scheduler for one-shot delayed tasks.
//!
//! Each task runs once after a delay. A failing task is retried after the same
//! delay until its retry budget is spent; live tasks can be cancelled and
//! inspected. Completion and cancellation are reported through per-task
//! callbacks and through an event stream for subscribers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │ (id, work,   │   │ (id, work,   │   │ (id, work,   │
//!     │  delay, ...) │   │  delay, ...) │   │  delay, ...) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - FeatureGate (scheduler / cancellation flags, read per call)    │
//! │  - Registry (id → live handle, generation-guarded)                │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ run_attempt  │   │ run_attempt  │   │ run_attempt  │
//!     │ sleep → work │   │ sleep → work │   │ sleep → work │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ TaskFired        │ TaskFailed       │ TaskCompleted
//!      │ ...              │ RetryScheduled   │ ...
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SchedulerConfig::bus_capacity)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                           bus listener ──► SubscriberSet
//!                                          ┌─────────┼─────────┐
//!                                          ▼         ▼         ▼
//!                                       worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! schedule(spec) ──► Pending ──(delay)──► Running ──► Ok / Canceled ──► Completed + on_complete
//!                       │                    │
//!                       │                    ├─► Fail, retries > 0 ──► Retrying ──► new attempt (Pending)
//!                       │                    ├─► Fail, retries = 0 ──► Completed + on_complete
//!                       │                    └─► Fatal             ──► Completed + on_complete
//!                       │
//!                       └─── cancel(id) (also while Running) ──► Cancelled + on_cancelled
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Scheduling**    | Delayed one-shot execution, retries, cancellation, queries.  | [`Scheduler`], [`TaskInfo`]               |
//! | **Tasks**         | Define work as closures or trait objects.                    | [`TaskRef`], [`TaskFn`], [`BlockingFn`]   |
//! | **Specs**         | Bundle work with delay, retries and callbacks.               | [`TaskSpec`], [`TimeUnit`]                |
//! | **Feature gates** | Turn scheduling or cancellation off at runtime.              | [`FeatureGate`], [`FeatureFlags`]         |
//! | **Subscriber API**| Observe task lifecycle events.                               | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed errors for the API and for the work.                   | [`ScheduleError`], [`TaskError`]          |
//! | **Configuration** | Centralize runtime settings.                                 | [`SchedulerConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber rendering events via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskdefer::{Scheduler, SchedulerConfig, TaskError, TaskFn, TaskRef, TaskSpec, TimeUnit};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskdefer::Subscribe>> = vec![Arc::new(taskdefer::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskdefer::Subscribe>> = Vec::new();
//!
//!     let sched = Scheduler::builder(SchedulerConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let hello: TaskRef = TaskFn::arc(|_ctx: CancellationToken| async move {
//!         println!("Hello from task!");
//!         Ok::<(), TaskError>(())
//!     });
//!
//!     let spec = TaskSpec::builder("hello")
//!         .with_work(hello)
//!         .with_delay(10, TimeUnit::Milliseconds)
//!         .with_retries(1)
//!         .build();
//!
//!     sched.schedule(spec).await?;
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     assert!(!sched.is_scheduled("hello").await);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod features;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{Scheduler, SchedulerBuilder, SchedulerConfig, TaskInfo, TaskState};
pub use error::{ScheduleError, TaskError};
pub use events::{Event, EventKind};
pub use features::{Feature, FeatureFlags, FeatureGate};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BlockingFn, Callback, Task, TaskFn, TaskRef, TaskSpec, TaskSpecBuilder, TimeUnit};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
