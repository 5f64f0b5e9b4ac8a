//! # Task lifecycle state.
//!
//! ```text
//! Pending ──► Running ──► Completed
//!    │           ├──────► Cancelled
//!    │           └──────► Retrying ──► (new handle) Pending
//!    └──────────────────► Cancelled
//! ```
//!
//! Terminal: `Completed`, `Cancelled`. A `Retrying` cell is never reused: the
//! re-armed attempt gets a fresh cell that starts in `Pending`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use crate::tasks::TaskRef;

/// Lifecycle state of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Timer armed, delay not yet elapsed.
    Pending = 0,
    /// Work is executing.
    Running = 1,
    /// Attempt failed; a successor attempt is being armed.
    Retrying = 2,
    /// Cancelled by a caller (terminal).
    Cancelled = 3,
    /// Finalized after the last attempt (terminal).
    Completed = 4,
}

impl TaskState {
    /// True for `Cancelled` and `Completed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Cancelled | TaskState::Completed)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            2 => TaskState::Retrying,
            3 => TaskState::Cancelled,
            _ => TaskState::Completed,
        }
    }
}

/// Atomic cell shared by a live handle and its retry wrapper.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: TaskState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `to` if the current state is one of `from`.
    pub(crate) fn transition(&self, from: &[TaskState], to: TaskState) -> bool {
        let mut cur = self.0.load(Ordering::Acquire);
        loop {
            if !from.contains(&TaskState::from_u8(cur)) {
                return false;
            }
            match self
                .0
                .compare_exchange(cur, to as u8, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => cur = actual,
            }
        }
    }
}

/// Read-only view of a registered task, returned by
/// [`Scheduler::get_task`](crate::Scheduler::get_task) and
/// [`Scheduler::list_tasks`](crate::Scheduler::list_tasks).
#[derive(Clone)]
pub struct TaskInfo {
    /// Task id.
    pub id: String,
    /// The scheduled work.
    pub work: TaskRef,
    /// Normalized delay applied before every attempt.
    pub delay: Duration,
    /// Retries left after the current attempt.
    pub retries: u32,
    /// Current attempt number (1-based).
    pub attempt: u32,
    /// Lifecycle state at the time of the snapshot.
    pub state: TaskState,
}

impl fmt::Debug for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskInfo")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .field("retries", &self.retries)
            .field("attempt", &self.attempt)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
