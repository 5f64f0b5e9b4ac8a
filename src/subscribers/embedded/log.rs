//! # LogWriter: event renderer over `tracing`
//!
//! A minimal subscriber that renders incoming [`Event`]s as structured `tracing`
//! records (target `taskdefer::events`). Install any `tracing` subscriber to see them.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO taskdefer::events: scheduled task="report" attempt=1 retries=2 delay_ms=500
//! INFO taskdefer::events: fired task="report" attempt=1
//! WARN taskdefer::events: failed task="report" attempt=1 reason="connection refused"
//! INFO taskdefer::events: retry task="report" attempt=2 retries=1 delay_ms=500
//! INFO taskdefer::events: completed task="report" attempt=3
//! INFO taskdefer::events: cancelled task="cleanup" attempt=1
//! ERROR taskdefer::events: dead task="sync" attempt=1 reason="..."
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "taskdefer::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::TaskScheduled => {
                tracing::info!(
                    target: TARGET,
                    task,
                    attempt = e.attempt,
                    retries = e.retries,
                    delay_ms = e.delay_ms,
                    "scheduled"
                );
            }
            EventKind::TaskFired => {
                tracing::info!(target: TARGET, task, attempt = e.attempt, "fired");
            }
            EventKind::TaskFailed => {
                tracing::warn!(
                    target: TARGET,
                    task,
                    attempt = e.attempt,
                    reason = e.reason.as_deref(),
                    "failed"
                );
            }
            EventKind::RetryScheduled => {
                tracing::info!(
                    target: TARGET,
                    task,
                    attempt = e.attempt,
                    retries = e.retries,
                    delay_ms = e.delay_ms,
                    "retry"
                );
            }
            EventKind::TaskCancelled => {
                tracing::info!(target: TARGET, task, attempt = e.attempt, "cancelled");
            }
            EventKind::TaskCompleted => {
                tracing::info!(
                    target: TARGET,
                    task,
                    attempt = e.attempt,
                    reason = e.reason.as_deref(),
                    "completed"
                );
            }
            EventKind::TaskDead => {
                tracing::error!(
                    target: TARGET,
                    task,
                    attempt = e.attempt,
                    reason = e.reason.as_deref(),
                    "dead"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
