//! # Dispatch queue: pending line, admission line, statistics.
//!
//! [`DispatchQueue`] owns the producer side of two bounded lines:
//!
//! - **pending line**: `mpsc` channel of tasks, capacity `pending_capacity`.
//!   A full line suspends producers (backpressure).
//! - **admission line**: semaphore with `admission_capacity` permits. The
//!   dispatcher holds one permit per executing task (concurrency cap).
//!
//! ## Architecture
//! ```text
//! task()/task_wait() ──► submit() ──► [pending line] ──► Dispatcher::run()
//!        ▲                  │ full → suspend                 │ acquire permit
//!        │                  ▼                                ▼
//!   result / callback   stats.overflow_producers      spawn(task.execute(slot))
//!        ▲                                                   │
//!        └────────────── outcome ◄───────────────────────────┘ slot released on exit
//! ```
//!
//! ## Rules
//! - At most `admission_capacity` tasks execute at once.
//! - At most `pending_capacity` tasks wait in the line; further producers suspend
//!   in FIFO order until space opens.
//! - The channel and the semaphore are the only shared state besides a stats
//!   counter; there are no additional locks.
//! - Dropping the queue shuts it down.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use tokio::sync::{Semaphore, broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;
use crate::tasks::{BoxTask, TaskId, TaskMode};

use super::builder::DispatchQueueBuilder;
use super::config::QueueConfig;

/// Point-in-time occupancy of a dispatch queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks buffered on the pending line.
    pub queued: usize,
    /// Producers suspended because the pending line is full.
    pub overflow_producers: usize,
    /// Tasks currently holding an admission slot.
    pub running: usize,
}

impl From<QueueStats> for (usize, usize, usize) {
    fn from(s: QueueStats) -> Self {
        (s.queued, s.overflow_producers, s.running)
    }
}

/// Bounded, admission-limited task dispatch queue.
///
/// Built with [`DispatchQueue::builder`]; the process-wide instance is
/// reachable through [`global`](crate::global).
///
/// Must be built inside a Tokio runtime: construction spawns the dispatcher.
///
/// ## Cooperative scheduling
/// Tasks run as Tokio tasks and only yield at `.await` points. Work that
/// computes for a long time without awaiting starves everything else scheduled
/// on its worker thread; splitting such work up (or moving it to
/// `spawn_blocking`) is the caller's responsibility.
pub struct DispatchQueue {
    cfg: QueueConfig,
    pub(crate) bus: Bus,
    pending: mpsc::Sender<BoxTask>,
    pub(crate) admission: Arc<Semaphore>,
    suspended_producers: AtomicUsize,
    token: CancellationToken,
}

impl DispatchQueue {
    /// Creates a builder for a queue with the given capacities.
    pub fn builder(cfg: QueueConfig) -> DispatchQueueBuilder {
        DispatchQueueBuilder::new(cfg)
    }

    /// Builds a queue with the given capacities and no subscribers.
    pub fn new(cfg: QueueConfig) -> Arc<Self> {
        DispatchQueueBuilder::new(cfg).build()
    }

    /// Builds a queue with subscribers attached.
    pub fn with_subscribers(cfg: QueueConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Arc<Self> {
        DispatchQueueBuilder::new(cfg)
            .with_subscribers(subscribers)
            .build()
    }

    pub(crate) fn new_internal(
        cfg: QueueConfig,
        bus: Bus,
        pending: mpsc::Sender<BoxTask>,
        admission: Arc<Semaphore>,
        token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            pending,
            admission,
            suspended_producers: AtomicUsize::new(0),
            token,
        }
    }

    /// Capacities this queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.cfg
    }

    /// Enqueues a task, suspending while the pending line is full.
    ///
    /// Fails with [`SubmitError::AddTaskFailed`] only when the line is closed.
    pub(crate) async fn submit(&self, task: BoxTask) -> Result<(), SubmitError> {
        if self.token.is_cancelled() {
            return Err(refuse(task, SubmitError::AddTaskFailed));
        }
        let (id, mode) = (task.id(), task.mode());

        let task = match self.pending.try_send(task) {
            Ok(()) => {
                self.publish_queued(id, mode);
                return Ok(());
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                return Err(refuse(task, SubmitError::AddTaskFailed));
            }
            Err(mpsc::error::TrySendError::Full(task)) => task,
        };

        self.bus.publish(
            Event::new(EventKind::ProducerSuspended)
                .with_task(id)
                .with_mode(mode),
        );
        let sent = {
            let _suspended = SuspendedProducer::enter(&self.suspended_producers);
            self.pending.send(task).await
        };
        sent.map_err(|mpsc::error::SendError(task)| refuse(task, SubmitError::AddTaskFailed))?;

        self.publish_queued(id, mode);
        Ok(())
    }

    /// Enqueues a task without suspending.
    pub(crate) fn try_submit(&self, task: BoxTask) -> Result<(), SubmitError> {
        if self.token.is_cancelled() {
            return Err(refuse(task, SubmitError::AddTaskFailed));
        }
        let (id, mode) = (task.id(), task.mode());

        self.pending.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(task) => refuse(task, SubmitError::Full),
            mpsc::error::TrySendError::Closed(task) => refuse(task, SubmitError::AddTaskFailed),
        })?;

        self.publish_queued(id, mode);
        Ok(())
    }

    /// True if no task is buffered on the pending line.
    pub fn is_empty(&self) -> bool {
        self.pending.capacity() == self.pending.max_capacity()
    }

    /// True if the pending line is at capacity (the next `submit` suspends).
    pub fn is_full(&self) -> bool {
        self.pending.capacity() == 0
    }

    /// Snapshot of queued, suspended-producer and running counts.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.pending.max_capacity() - self.pending.capacity(),
            overflow_producers: self.suspended_producers.load(AtomicOrdering::Relaxed),
            running: self
                .cfg
                .admission_capacity_clamped()
                .saturating_sub(self.admission.available_permits()),
        }
    }

    /// Creates a receiver for this queue's events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops dispatching.
    ///
    /// Tasks still on the pending line are dropped (their waiters and finish
    /// callbacks observe [`TaskError::Lost`](crate::TaskError::Lost)); later submissions fail with
    /// [`SubmitError::AddTaskFailed`]. Tasks already executing run to completion.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once the queue no longer accepts tasks.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.pending.is_closed()
    }

    fn publish_queued(&self, id: TaskId, mode: TaskMode) {
        self.bus
            .publish(Event::new(EventKind::TaskQueued).with_task(id).with_mode(mode));
    }
}

impl Drop for DispatchQueue {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Drops a task the pending line did not accept, without notifying it.
fn refuse(mut task: BoxTask, err: SubmitError) -> SubmitError {
    task.disarm();
    err
}

/// Counts a producer as suspended for as long as it is alive.
struct SuspendedProducer<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> SuspendedProducer<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, AtomicOrdering::Relaxed);
        Self { counter }
    }
}

impl Drop for SuspendedProducer<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, AtomicOrdering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fresh_queue_is_empty() {
        let queue = DispatchQueue::new(QueueConfig::new(4, 2));
        assert!(queue.is_empty());
        assert!(!queue.is_full());
        assert!(!queue.is_closed());
        assert_eq!(queue.stats(), QueueStats::default());
        assert_eq!(queue.config().pending_capacity, 4);
    }

    #[tokio::test]
    async fn test_stats_tuple_order() {
        let stats = QueueStats {
            queued: 1,
            overflow_producers: 2,
            running: 3,
        };
        let tuple: (usize, usize, usize) = stats.into();
        assert_eq!(tuple, (1, 2, 3));
    }

    #[tokio::test]
    async fn test_suspended_producer_guard() {
        let counter = AtomicUsize::new(0);
        {
            let _a = SuspendedProducer::enter(&counter);
            let _b = SuspendedProducer::enter(&counter);
            assert_eq!(counter.load(AtomicOrdering::Relaxed), 2);
        }
        assert_eq!(counter.load(AtomicOrdering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_closed_admission_line_kills_dispatcher() {
        let queue = DispatchQueue::new(QueueConfig::new(4, 1));
        let mut rx = queue.subscribe();
        queue.admission.close();

        let res: Result<u8, crate::TaskError<String>> =
            queue.task_wait(|| async { Ok(1) }, None).await;
        assert!(matches!(res, Err(crate::TaskError::Lost { .. })));

        let dead = loop {
            let ev = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("event in time")
                .expect("bus open");
            if ev.kind == EventKind::DispatcherDead {
                break ev;
            }
        };
        assert!(dead.reason.as_deref().unwrap_or_default().contains("admission"));

        let again = queue.task(|| async { Ok::<_, String>(()) }).await;
        assert_eq!(again, Err(SubmitError::AddTaskFailed));
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_submissions() {
        let queue = DispatchQueue::new(QueueConfig::new(4, 1));
        queue.shutdown();

        assert!(queue.is_closed());
        assert_eq!(
            queue.task(|| async { Ok::<_, String>(()) }).await,
            Err(SubmitError::AddTaskFailed)
        );
        assert_eq!(
            queue.try_task(|| async { Ok::<_, String>(()) }),
            Err(SubmitError::AddTaskFailed)
        );
    }
}
