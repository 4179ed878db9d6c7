//! Error types used by the dispatch queue and its submission API.
//!
//! - [`SubmitError`]: the pending line refused a task.
//! - [`TaskError`]: everything a submitter can observe about one task (its own
//!   failure, a panic, a wait timeout, a lost result).
//! - [`ConfigError`]: invalid or late configuration of the global queue.
//!
//! All enums provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::tasks::TaskId;

/// # Errors produced when enqueuing a task.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The pending line is closed (queue shut down or dispatcher dead).
    ///
    /// Never happens in normal operation of the global queue; treat it as a
    /// consistency fault rather than a backpressure signal.
    #[error("failed to add task: dispatch queue is closed")]
    AddTaskFailed,

    /// The pending line is full. Only returned by the non-blocking `try_task`.
    #[error("failed to add task: pending line is full")]
    Full,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dispatchq::SubmitError;
    ///
    /// assert_eq!(SubmitError::AddTaskFailed.as_label(), "add_task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::AddTaskFailed => "add_task_failed",
            SubmitError::Full => "queue_full",
        }
    }
}

/// # Errors observed by the submitter of a task.
///
/// `E` is the application error type returned by the task's work. It is carried
/// verbatim in [`TaskError::Failed`], never stringified.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError<E> {
    /// The task could not be enqueued.
    #[error(transparent)]
    AddTaskFailed(#[from] SubmitError),

    /// No result arrived before the deadline. The task keeps running.
    #[error("task {id} timed out after {timeout:?}")]
    Timeout {
        /// Task that was waited on.
        id: TaskId,
        /// The budget requested by the caller.
        timeout: Duration,
    },

    /// The work returned an error.
    #[error("task {id} failed: {error}")]
    Failed {
        /// Task that failed.
        id: TaskId,
        /// The application error, unchanged.
        error: E,
    },

    /// The work panicked.
    #[error("task {id} panicked: {message}")]
    Panicked {
        /// Task that panicked.
        id: TaskId,
        /// Panic payload rendered as text.
        message: String,
    },

    /// The task was dropped before it could report (queue shut down while it was pending).
    #[error("task {id} was dropped before delivering a result")]
    Lost {
        /// Task whose result channel closed empty.
        id: TaskId,
    },
}

impl<E> TaskError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::AddTaskFailed(e) => e.as_label(),
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Failed { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Lost { .. } => "task_lost",
        }
    }

    /// Returns the id of the task the error belongs to, if it was ever assigned one in the queue.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            TaskError::AddTaskFailed(_) => None,
            TaskError::Timeout { id, .. }
            | TaskError::Failed { id, .. }
            | TaskError::Panicked { id, .. }
            | TaskError::Lost { id } => Some(*id),
        }
    }

    /// True for [`TaskError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }

    /// Returns the application error if the work itself failed.
    pub fn into_failure(self) -> Option<E> {
        match self {
            TaskError::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// # Errors produced by [`configure`](crate::configure).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The global queue already exists; its capacities are fixed.
    #[error(
        "dispatch queue already started with pending_capacity={pending_capacity} \
         admission_capacity={admission_capacity}; configuration ignored"
    )]
    AlreadyStarted {
        /// Capacity in effect.
        pending_capacity: usize,
        /// Capacity in effect.
        admission_capacity: usize,
    },

    /// A capacity of zero would make every submission fail or stall forever.
    #[error("{field} must be greater than zero")]
    ZeroCapacity {
        /// Name of the offending field.
        field: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::AlreadyStarted { .. } => "config_already_started",
            ConfigError::ZeroCapacity { .. } => "config_zero_capacity",
        }
    }
}
