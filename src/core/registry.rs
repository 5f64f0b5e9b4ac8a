//! # Task registry - the single source of truth for live tasks.
//!
//! Maps task id → [`Handle`]. A handle exists from the moment scheduling
//! succeeds until the task is finalized, cancelled, or replaced by its retry.
//!
//! ## Architecture
//! ```text
//! Scheduler::schedule ──► insert_with(id, arm)     → TaskExists / capacity / insert
//! Scheduler::cancel   ──► cancel(id)               → remove + Cancelled + token.cancel()
//! retry wrapper       ──► replace_with(id, gen)    → Retrying + swap in successor
//! retry wrapper       ──► finalize(id, gen)        → Completed + remove
//! Scheduler::shutdown ──► drain()
//! ```
//!
//! ## Rules
//! - Registry owns the handles (JoinHandle + CancellationToken + state cell)
//! - Every lifecycle transition that adds or removes an entry happens under the
//!   write lock, so a terminal state is never observable through the registry
//! - Each handle carries a generation; a stale wrapper can never finalize or
//!   replace its successor
//! - Removal is idempotent: a second finalize/cancel for the same handle is a no-op

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::state::{StateCell, TaskInfo, TaskState};
use crate::error::ScheduleError;
use crate::tasks::TaskDescriptor;

/// Live handle of one armed attempt.
pub(crate) struct Handle {
    /// Frozen task descriptor (shared with the retry wrapper).
    pub task: Arc<TaskDescriptor>,
    /// Registry generation of this handle.
    pub generation: u64,
    /// Retries left after this attempt.
    pub retries: u32,
    /// Attempt this handle runs (1-based).
    pub attempt: u32,
    /// Lifecycle state shared with the retry wrapper.
    pub state: Arc<StateCell>,
    /// Cancels the pending sleep or the running work.
    pub cancel: CancellationToken,
    /// Join handle of the retry wrapper.
    pub join: JoinHandle<()>,
}

impl Handle {
    fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.task.id.to_string(),
            work: Arc::clone(&self.task.work),
            delay: self.task.delay,
            retries: self.retries,
            attempt: self.attempt,
            state: self.state.load(),
        }
    }
}

/// Outcome of a cancel request on a registered task.
pub(crate) struct Cancellation {
    pub task: Arc<TaskDescriptor>,
    pub attempt: u32,
}

/// Concurrent registry of live tasks.
pub(crate) struct Registry {
    tasks: RwLock<HashMap<Arc<str>, Handle>>,
    generation: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a new task.
    ///
    /// `arm` runs under the write lock and receives the handle's generation; it is
    /// only called once the id is known to be free and capacity is available.
    pub async fn insert_with<F>(
        &self,
        id: &Arc<str>,
        limit: Option<usize>,
        arm: F,
    ) -> Result<(), ScheduleError>
    where
        F: FnOnce(u64) -> Result<Handle, ScheduleError>,
    {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&**id) {
            return Err(ScheduleError::TaskExists { id: id.to_string() });
        }
        if let Some(max) = limit {
            if tasks.len() >= max {
                return Err(ScheduleError::rejected(
                    &**id,
                    format!("capacity of {max} pending tasks reached"),
                ));
            }
        }

        let handle = arm(self.next_generation())?;
        tasks.insert(Arc::clone(id), handle);
        Ok(())
    }

    /// Swaps the handle `(id, generation)` for its retry.
    ///
    /// Returns `Ok(false)` when the handle is gone or no longer running (cancelled
    /// or superseded). When `arm` fails the entry is removed and the error returned.
    pub async fn replace_with<F>(
        &self,
        id: &str,
        generation: u64,
        arm: F,
    ) -> Result<bool, ScheduleError>
    where
        F: FnOnce(u64) -> Result<Handle, ScheduleError>,
    {
        let mut tasks = self.tasks.write().await;
        let Some(current) = tasks.get(id) else {
            return Ok(false);
        };
        if current.generation != generation
            || !current
                .state
                .transition(&[TaskState::Running], TaskState::Retrying)
        {
            return Ok(false);
        }

        match arm(self.next_generation()) {
            Ok(handle) => {
                tasks.insert(Arc::clone(&handle.task.id), handle);
                Ok(true)
            }
            Err(e) => {
                tasks.remove(id);
                Err(e)
            }
        }
    }

    /// Cancels and removes the live handle for `id`.
    ///
    /// Returns `None` when the id is unknown. A registered handle is always
    /// cancellable: completed and cancelled handles leave the map in the same
    /// locked step that ends them, and a `Retrying` handle is swapped out before
    /// the lock is released.
    pub async fn cancel(&self, id: &str) -> Option<Cancellation> {
        let mut tasks = self.tasks.write().await;
        let handle = tasks.remove(id)?;
        handle.state.transition(
            &[TaskState::Pending, TaskState::Running, TaskState::Retrying],
            TaskState::Cancelled,
        );
        handle.cancel.cancel();
        Some(Cancellation {
            task: handle.task,
            attempt: handle.attempt,
        })
    }

    /// Marks `(id, generation)` completed and removes it.
    ///
    /// Returns `false` if the handle was cancelled or replaced in the meantime.
    pub async fn finalize(&self, id: &str, generation: u64) -> bool {
        let mut tasks = self.tasks.write().await;
        let completed = match tasks.get(id) {
            Some(h) if h.generation == generation => h
                .state
                .transition(&[TaskState::Running], TaskState::Completed),
            _ => false,
        };
        if completed {
            tasks.remove(id);
        }
        completed
    }

    /// Returns a snapshot of the task registered under `id`.
    pub async fn get(&self, id: &str) -> Option<TaskInfo> {
        self.tasks.read().await.get(id).map(Handle::info)
    }

    /// Returns a snapshot of every registered task.
    pub async fn snapshot(&self) -> HashMap<String, TaskInfo> {
        let tasks = self.tasks.read().await;
        tasks
            .iter()
            .map(|(id, h)| (id.to_string(), h.info()))
            .collect()
    }

    /// True if a task is registered under `id`.
    pub async fn contains(&self, id: &str) -> bool {
        self.tasks.read().await.contains_key(id)
    }

    /// Number of registered tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Removes and returns every handle.
    pub async fn drain(&self) -> Vec<Handle> {
        let mut tasks = self.tasks.write().await;
        tasks.drain().map(|(_, h)| h).collect()
    }
}
