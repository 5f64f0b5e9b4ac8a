//! # Run one armed attempt of a scheduled task.
//!
//! Every arming (initial schedule or retry) spawns exactly one [`run_attempt`]
//! future. It sleeps for the task delay, executes the work once, and then either
//! finalizes the task or asks the registry to swap in a successor attempt.
//!
//! ## Event flow
//!
//! ```text
//! Success / Canceled:
//!   sleep → TaskFired → work → Ok | Err(Canceled)  → finalize → TaskCompleted → on_complete
//!
//! Failure with budget:
//!   sleep → TaskFired → work → Err(Fail)           → TaskFailed → replace_with → RetryScheduled
//!
//! Failure without budget / Fatal:
//!   sleep → TaskFired → work → Err(..)             → TaskFailed → finalize → TaskCompleted(reason)
//!
//! Re-arm refused (scheduler flag off):
//!   ... → replace_with → Err(e) → TaskDead (no callbacks)
//!
//! Re-arm during shutdown:
//!   ... → return (silent, the registry is being drained)
//!
//! Cancelled (token):
//!   sleep | work interrupted → return (the canceller owns events and callbacks)
//! ```
//!
//! ## Rules
//! - A panic inside work is caught and treated as `Fail`
//! - `Canceled` returned by work is a graceful exit, not a failure
//! - Finalization is generation-guarded: a cancelled or replaced attempt is silent

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        panic_message,
        scheduler::Core,
        state::{StateCell, TaskState},
    },
    error::TaskError,
    events::{Event, EventKind},
    features::Feature,
    tasks::{Callback, TaskDescriptor, TaskRef},
};

/// Everything a spawned attempt needs; created by `Core::arm`.
pub(crate) struct Attempt {
    pub task: Arc<TaskDescriptor>,
    pub generation: u64,
    pub retries: u32,
    pub attempt: u32,
    pub state: Arc<StateCell>,
    pub token: CancellationToken,
}

/// Drives one attempt from timer to finalization or re-arm.
pub(crate) async fn run_attempt(core: Arc<Core>, at: Attempt) {
    tokio::select! {
        biased;
        _ = at.token.cancelled() => return,
        _ = time::sleep(at.task.delay) => {}
    }

    if !at.state.transition(&[TaskState::Pending], TaskState::Running) {
        return;
    }
    core.bus.publish(
        Event::new(EventKind::TaskFired)
            .with_task(Arc::clone(&at.task.id))
            .with_attempt(at.attempt),
    );

    let res = tokio::select! {
        biased;
        _ = at.token.cancelled() => return,
        res = execute(&at.task.work, at.token.child_token()) => res,
    };

    match res {
        Ok(()) | Err(TaskError::Canceled) => finalize(&core, &at, None).await,
        Err(e) => {
            core.bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(Arc::clone(&at.task.id))
                    .with_attempt(at.attempt)
                    .with_reason(e.to_string()),
            );
            if e.is_retryable() && at.retries > 0 {
                retry(&core, &at).await;
            } else {
                finalize(&core, &at, Some(&e)).await;
            }
        }
    }
}

/// Runs the work once, converting a panic into [`TaskError::Fail`].
async fn execute(work: &TaskRef, ctx: CancellationToken) -> Result<(), TaskError> {
    match AssertUnwindSafe(work.run(ctx)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(TaskError::fail(format!(
            "work panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

/// Marks the task completed, publishes `TaskCompleted`, then runs `on_complete`.
async fn finalize(core: &Core, at: &Attempt, last_error: Option<&TaskError>) {
    if !core.registry.finalize(&at.task.id, at.generation).await {
        return;
    }

    let mut ev = Event::new(EventKind::TaskCompleted)
        .with_task(Arc::clone(&at.task.id))
        .with_attempt(at.attempt);
    if let Some(e) = last_error {
        ev = ev.with_reason(e.to_string());
    }
    core.bus.publish(ev);

    if let Some(cb) = &at.task.on_complete {
        invoke_callback(cb, &at.task.id, "on_complete");
    }
}

/// Replaces this attempt with a fresh one carrying one less retry.
///
/// A re-arm refused because the scheduler is shutting down is silent; any other
/// refusal drops the task and publishes `TaskDead`.
async fn retry(core: &Arc<Core>, at: &Attempt) {
    if core.runtime_token.is_cancelled() {
        return;
    }
    let retries = at.retries.saturating_sub(1);
    let attempt = at.attempt.saturating_add(1);

    let rearmed = core
        .registry
        .replace_with(&at.task.id, at.generation, |generation| {
            core.ensure_enabled(Feature::Scheduler)?;
            let announce = Event::new(EventKind::RetryScheduled)
                .with_task(Arc::clone(&at.task.id))
                .with_attempt(attempt)
                .with_retries(retries)
                .with_delay(at.task.delay);
            core.arm(Arc::clone(&at.task), retries, attempt, generation, announce)
        })
        .await;

    if let Err(e) = rearmed {
        if core.runtime_token.is_cancelled() {
            tracing::debug!(task = %at.task.id, attempt, "retry skipped: scheduler shut down");
            return;
        }
        tracing::error!(
            task = %at.task.id,
            attempt,
            error = %e,
            "retry could not be armed; task dropped"
        );
        core.bus.publish(
            Event::new(EventKind::TaskDead)
                .with_task(Arc::clone(&at.task.id))
                .with_attempt(at.attempt)
                .with_reason(e.to_string()),
        );
    }
}

/// Invokes a user callback, logging (not propagating) a panic.
pub(crate) fn invoke_callback(cb: &Callback, task: &str, which: &'static str) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| cb())) {
        tracing::warn!(
            task,
            callback = which,
            panic = %panic_message(panic.as_ref()),
            "callback panicked"
        );
    }
}
