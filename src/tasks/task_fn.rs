//! # Function-backed work (`TaskFn`, `BlockingFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per attempt. No state is shared between retries unless the closure
//! captures it explicitly (e.g. an `Arc<AtomicU32>` counter).
//!
//! [`BlockingFn`] wraps a synchronous closure and runs every attempt on tokio's
//! blocking pool, so work that sleeps or does blocking I/O never stalls the
//! timer. Blocking work cannot be interrupted; cancelling it only detaches the
//! attempt.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskdefer::{BlockingFn, TaskFn, TaskRef, TaskError};
//!
//! let ping: TaskRef = TaskFn::arc(|ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(())
//! });
//!
//! let rotate: TaskRef = BlockingFn::arc(|| {
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//!     Ok(())
//! });
//! # let _ = (ping, rotate);
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Async closure-backed work.
#[derive(Debug)]
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}

/// Synchronous closure-backed work, executed on the blocking pool.
#[derive(Debug)]
pub struct BlockingFn<F> {
    f: Arc<F>,
}

impl<F> BlockingFn<F> {
    /// Creates new blocking work.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Creates the work and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> Task for BlockingFn<F>
where
    F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
{
    async fn run(&self, _ctx: CancellationToken) -> Result<(), TaskError> {
        let f = Arc::clone(&self.f);
        match tokio::task::spawn_blocking(move || f()).await {
            Ok(res) => res,
            Err(je) if je.is_panic() => Err(TaskError::fail("blocking work panicked")),
            Err(je) => Err(TaskError::fail(je.to_string())),
        }
    }
}
