//! Error types used by the scheduler and by scheduled work.
//!
//! This module defines two main error enums:
//!
//! - [`ScheduleError`]: errors returned synchronously by the scheduler API
//!   (`schedule`, `schedule_all`, `cancel`).
//! - [`TaskError`]: errors returned by a single execution of scheduled work.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and [`TaskError::is_retryable`] drives the retry decision.

use thiserror::Error;

use crate::features::Feature;

/// # Errors produced by the scheduler API.
///
/// Every variant is recoverable by the caller and is surfaced from the call that
/// triggered it. Failures of the scheduled work itself are never reported here.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A feature gate consulted by the call is closed.
    #[error("feature '{feature}' is disabled by configuration")]
    FeatureDisabled {
        /// The gate that refused the call.
        feature: Feature,
    },

    /// The task specification is missing a required field.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Which field was rejected.
        reason: String,
    },

    /// The task does not exist in the scheduler or has already terminated.
    #[error("task '{id}' does not exist or has already terminated")]
    TaskNotFound {
        /// Requested task id.
        id: String,
    },

    /// The execution facility refused the submission.
    #[error("scheduling of task '{id}' rejected: {reason}")]
    SchedulingRejected {
        /// Task id of the refused submission.
        id: String,
        /// Why the submission was refused.
        reason: String,
    },

    /// A live task with the same id is already registered.
    #[error("task '{id}' is already scheduled")]
    TaskExists {
        /// Conflicting task id.
        id: String,
    },
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskdefer::ScheduleError;
    ///
    /// let err = ScheduleError::TaskNotFound { id: "job".into() };
    /// assert_eq!(err.as_label(), "task_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::FeatureDisabled { .. } => "feature_disabled",
            ScheduleError::InvalidArgument { .. } => "invalid_argument",
            ScheduleError::TaskNotFound { .. } => "task_not_found",
            ScheduleError::SchedulingRejected { .. } => "scheduling_rejected",
            ScheduleError::TaskExists { .. } => "task_exists",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ScheduleError::FeatureDisabled { feature } => format!("disabled: {feature}"),
            ScheduleError::InvalidArgument { reason } => format!("invalid: {reason}"),
            ScheduleError::TaskNotFound { id } => format!("not found: {id}"),
            ScheduleError::SchedulingRejected { id, reason } => {
                format!("rejected: {id} ({reason})")
            }
            ScheduleError::TaskExists { id } => format!("exists: {id}"),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ScheduleError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn rejected(id: impl Into<String>, reason: impl Into<String>) -> Self {
        ScheduleError::SchedulingRejected {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// # Errors produced by scheduled work.
///
/// Returned by a single execution of a [`Task`](crate::Task). `Fail` consumes
/// one unit of the retry budget; `Fatal` finalizes the task immediately.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Non-recoverable fatal error (should not be retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Execution failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Work observed its cancellation token and exited early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskdefer::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the failure may consume a retry.
    ///
    /// Returns `true` only for [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskdefer::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// assert!(!TaskError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}
