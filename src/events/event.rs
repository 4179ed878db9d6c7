//! # Events emitted by the dispatch queue and its tasks.
//!
//! [`EventKind`] covers four groups:
//! - **Dispatcher**: the drain loop starting, stopping or dying
//! - **Queue**: tasks entering the pending line, producers hitting backpressure
//! - **Task**: execution start/end and what happened to the outcome
//! - **Subscriber**: overflow and panics inside user subscribers
//!
//! ## Ordering guarantees
//! Every event gets a process-wide sequence number (`seq`) that increases
//! monotonically. Use it to restore order when events arrive interleaved.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use dispatchq::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WaitTimedOut)
//!     .with_reason("caller gave up")
//!     .with_timeout(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::WaitTimedOut);
//! assert_eq!(ev.timeout_ms, Some(250));
//! assert_eq!(ev.reason.as_deref(), Some("caller gave up"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::{TaskId, TaskMode};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Dispatcher ===
    /// Dispatcher loop started.
    DispatcherStarted,

    /// Dispatcher loop exited normally (shutdown or queue dropped).
    DispatcherStopped,

    /// Dispatcher loop aborted on a broken internal invariant.
    ///
    /// Sets `reason`. The pending line is closed afterwards.
    DispatcherDead,

    // === Queue ===
    /// Task accepted onto the pending line.
    ///
    /// Sets `task`, `mode`.
    TaskQueued,

    /// Producer found the pending line full and is suspended.
    ///
    /// Sets `task`, `mode`.
    ProducerSuspended,

    /// Late call to `configure` on an already started global queue.
    ///
    /// Sets `reason`.
    ConfigureIgnored,

    // === Task ===
    /// Work is about to run on its own spawned task.
    ///
    /// Sets `task`, `mode`.
    TaskStarting,

    /// Work returned a value.
    ///
    /// Sets `task`, `mode`.
    TaskCompleted,

    /// Work returned an error or panicked.
    ///
    /// Sets `task`, `mode`, `reason`.
    TaskFailed,

    /// Detached task failed and had no finish callback to receive the failure.
    ///
    /// Sets `task`, `mode`, `reason`.
    FailureUnobserved,

    /// Finish callback of a detached task panicked.
    ///
    /// Sets `task`, `mode`, `reason`.
    FinishPanicked,

    /// Submitter stopped waiting; the task keeps running.
    ///
    /// Sets `task`, `mode`, `timeout_ms`.
    WaitTimedOut,

    /// Wait task finished after its submitter left; the outcome was dropped.
    ///
    /// Sets `task`, `mode`.
    ResultDiscarded,

    // === Subscribers ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `reason`.
    SubscriberOverflow,

    /// Subscriber panicked while handling an event.
    ///
    /// Sets `reason`.
    SubscriberPanicked,
}

impl EventKind {
    /// Short kebab-case tag used by log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DispatcherStarted => "dispatcher-started",
            EventKind::DispatcherStopped => "dispatcher-stopped",
            EventKind::DispatcherDead => "dispatcher-dead",
            EventKind::TaskQueued => "queued",
            EventKind::ProducerSuspended => "producer-suspended",
            EventKind::ConfigureIgnored => "configure-ignored",
            EventKind::TaskStarting => "starting",
            EventKind::TaskCompleted => "completed",
            EventKind::TaskFailed => "failed",
            EventKind::FailureUnobserved => "failure-unobserved",
            EventKind::FinishPanicked => "finish-panicked",
            EventKind::WaitTimedOut => "wait-timeout",
            EventKind::ResultDiscarded => "result-discarded",
            EventKind::SubscriberOverflow => "subscriber-overflow",
            EventKind::SubscriberPanicked => "subscriber-panicked",
        }
    }
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task the event refers to.
    pub task: Option<TaskId>,
    /// Completion protocol of that task.
    pub mode: Option<TaskMode>,
    /// Human-readable detail (error text, subscriber name, ...).
    pub reason: Option<Arc<str>>,
    /// Wait timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            mode: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, id: TaskId) -> Self {
        self.task = Some(id);
        self
    }

    /// Attaches the task's completion protocol.
    #[inline]
    pub fn with_mode(mut self, mode: TaskMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}
