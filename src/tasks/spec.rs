//! # Task specification for delayed one-shot execution.
//!
//! Defines [`TaskSpec`], the descriptor a caller hands to
//! [`Scheduler::schedule`](crate::Scheduler::schedule): what to run, after which
//! delay, how many times to retry on failure and which callbacks to fire.
//!
//! A spec can be created:
//! - **With the builder** via [`TaskSpec::builder`] (recommended)
//! - **Field by field** from [`TaskSpec::default`] and the `set_*` methods, which
//!   is how descriptors assembled from user input are usually built
//!
//! ## Rules
//! - `id`, `work` and `unit` are required; [`TaskSpec::validate`] rejects a spec
//!   missing any of them with [`ScheduleError::InvalidArgument`].
//! - Validation normalizes in place: a negative delay becomes `0` (fire as soon
//!   as possible) and a negative retry budget becomes `0`.
//! - Once accepted, the spec is frozen: id, work, delay and callbacks are shared
//!   immutably, the remaining retry budget lives in the scheduler only.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScheduleError;
use crate::tasks::task::TaskRef;
use crate::tasks::unit::TimeUnit;

/// Zero-argument callback fired on completion or cancellation.
pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Specification of a task to run once after a delay.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use taskdefer::{TaskFn, TaskSpec, TimeUnit, TaskError};
///
/// let spec = TaskSpec::builder("nightly-report")
///     .with_work(TaskFn::arc(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) }))
///     .with_delay(-5, TimeUnit::Seconds)
///     .with_retries(2)
///     .on_complete(|| println!("report done"))
///     .build();
///
/// let mut spec = spec;
/// spec.validate().unwrap();
/// assert_eq!(spec.delay(), 0);
/// assert_eq!(spec.retries(), 2);
/// ```
#[derive(Clone, Default)]
pub struct TaskSpec {
    pub(super) id: String,
    pub(super) work: Option<TaskRef>,
    pub(super) delay: i64,
    pub(super) unit: Option<TimeUnit>,
    pub(super) retries: i32,
    pub(super) on_complete: Option<Callback>,
    pub(super) on_cancelled: Option<Callback>,
}

impl TaskSpec {
    /// Returns the task id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the work, if set.
    pub fn work(&self) -> Option<&TaskRef> {
        self.work.as_ref()
    }

    /// Returns the delay amount (in [`TaskSpec::unit`]).
    pub fn delay(&self) -> i64 {
        self.delay
    }

    /// Returns the delay unit, if set.
    pub fn unit(&self) -> Option<TimeUnit> {
        self.unit
    }

    /// Returns the retry budget.
    pub fn retries(&self) -> i32 {
        self.retries
    }

    /// Returns the completion callback, if set.
    pub fn on_complete_callback(&self) -> Option<&Callback> {
        self.on_complete.as_ref()
    }

    /// Returns the cancellation callback, if set.
    pub fn on_cancelled_callback(&self) -> Option<&Callback> {
        self.on_cancelled.as_ref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn set_work(&mut self, work: Option<TaskRef>) {
        self.work = work;
    }

    pub fn set_delay(&mut self, delay: i64) {
        self.delay = delay;
    }

    pub fn set_unit(&mut self, unit: Option<TimeUnit>) {
        self.unit = unit;
    }

    pub fn set_retries(&mut self, retries: i32) {
        self.retries = retries;
    }

    /// Checks required fields and normalizes delay and retry budget in place.
    ///
    /// Idempotent: validating an already normalized spec changes nothing.
    pub fn validate(&mut self) -> Result<(), ScheduleError> {
        if self.id.is_empty() {
            return Err(ScheduleError::invalid("id cannot be empty"));
        }
        if self.work.is_none() {
            return Err(ScheduleError::invalid("work cannot be absent"));
        }
        if self.unit.is_none() {
            return Err(ScheduleError::invalid("unit cannot be absent"));
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        if self.delay < 0 {
            self.delay = 0;
        }
        if self.retries < 0 {
            self.retries = 0;
        }
    }

    /// Validates and freezes the spec; returns the descriptor and the retry budget.
    pub(crate) fn into_descriptor(mut self) -> Result<(Arc<TaskDescriptor>, u32), ScheduleError> {
        self.validate()?;
        let (Some(work), Some(unit)) = (self.work, self.unit) else {
            return Err(ScheduleError::invalid("work and unit are required"));
        };

        let delay = unit.to_duration(u64::try_from(self.delay).unwrap_or(0));
        let retries = u32::try_from(self.retries).unwrap_or(0);
        let descriptor = TaskDescriptor {
            id: Arc::from(self.id),
            work,
            delay,
            on_complete: self.on_complete,
            on_cancelled: self.on_cancelled,
        };
        Ok((Arc::new(descriptor), retries))
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("id", &self.id)
            .field("work", &self.work.is_some())
            .field("delay", &self.delay)
            .field("unit", &self.unit)
            .field("retries", &self.retries)
            .field("on_complete", &self.on_complete.is_some())
            .field("on_cancelled", &self.on_cancelled.is_some())
            .finish()
    }
}

/// Accepted, immutable part of a task. Shared by the registry and every retry.
pub(crate) struct TaskDescriptor {
    pub id: Arc<str>,
    pub work: TaskRef,
    pub delay: Duration,
    pub on_complete: Option<Callback>,
    pub on_cancelled: Option<Callback>,
}
