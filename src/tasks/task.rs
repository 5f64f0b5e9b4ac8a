//! # Work abstraction.
//!
//! This module defines the [`Task`] trait: the unit of work a scheduled task runs
//! once its delay has elapsed. The common handle type is [`TaskRef`], an
//! `Arc<dyn Task>` shared between the caller, the registry and the retry wrapper.
//!
//! Work receives a [`CancellationToken`] that is cancelled when the scheduled task
//! is cancelled or the scheduler shuts down. Cancellation also drops the running
//! future at its next await point, so cooperating with the token is only needed
//! for work that has to clean up or that blocks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a unit of work.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use taskdefer::{Task, TaskError};
///
/// struct Flush;
///
/// #[async_trait]
/// impl Task for Flush {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Executes one attempt of the work.
    ///
    /// Returning [`TaskError::Fail`] consumes one retry if any are left.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
