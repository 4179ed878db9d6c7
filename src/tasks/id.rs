//! # Task identity.
//!
//! [`TaskId`] is assigned once, at construction, from a process-wide counter.
//! Ids strictly increase and are never reused for the lifetime of the process,
//! regardless of which [`DispatchQueue`](crate::DispatchQueue) a task goes to.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter; `0` is never handed out.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique, monotonically increasing task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocates the next id.
    pub(crate) fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw numeric id.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        TaskId(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Completion protocol of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskMode {
    /// Fire-and-forget; completion is only observed through the finish callback.
    Detached,
    /// The submitter awaits the result (optionally with a timeout).
    Wait,
}

impl TaskMode {
    /// Short lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskMode::Detached => "detached",
            TaskMode::Wait => "wait",
        }
    }
}
