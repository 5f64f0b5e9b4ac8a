//! # Lifecycle events emitted by the scheduler.
//!
//! The [`EventKind`] enum classifies event types:
//! - **Submission events**: a task was accepted and its timer armed
//! - **Execution events**: the timer fired, an attempt failed, a retry was armed
//! - **Terminal events**: completed, cancelled, or dead (re-arm refused)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task id,
//! attempt number, remaining retries and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskdefer::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("report")
//!     .with_reason("boom")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(500));
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("report"));
//! assert_eq!(ev.delay_ms, Some(500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of scheduler events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Task accepted, timer armed and handle registered.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: attempt the timer will run (1-based)
    /// - `retries`: retry budget left
    /// - `delay_ms`: delay before the attempt (ms)
    TaskScheduled,

    /// Delay elapsed; the attempt is starting.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: attempt number
    TaskFired,

    /// An attempt returned an error (or panicked).
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: attempt number
    /// - `reason`: failure message
    TaskFailed,

    /// A failed attempt was re-armed under the same id.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: the upcoming attempt number
    /// - `retries`: retry budget left after this retry
    /// - `delay_ms`: delay before the next attempt (ms)
    /// - `reason`: last failure message
    RetryScheduled,

    /// Task was cancelled by a caller.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: attempt that was pending or running
    TaskCancelled,

    /// Task finalized after its last attempt.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: last attempt number
    /// - `reason`: last failure message when retries were exhausted
    TaskCompleted,

    /// A retry could not be re-armed; the task was dropped from the registry.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: last attempt number
    /// - `reason`: why the re-arm was refused
    TaskDead,
}

/// Scheduler event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Id of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Remaining retry budget.
    pub retries: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, refusal details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            attempt: None,
            retries: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the remaining retry budget.
    #[inline]
    pub fn with_retries(mut self, n: u32) -> Self {
        self.retries = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for `TaskCompleted`, `TaskCancelled` and `TaskDead`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TaskCompleted | EventKind::TaskCancelled | EventKind::TaskDead
        )
    }
}
