//! # Batch: collect the outcomes of several detached tasks.
//!
//! [`Batch`] is a thin layer over [`DispatchQueue::task_then`]: every added task
//! reports through its finish callback into a shared unbounded channel, and
//! [`Batch::wait_all`] drains that channel until every task has reported or the
//! deadline passes.
//!
//! ```text
//! add(w1) ─► task_then(w1, tx) ─┐
//! add(w2) ─► task_then(w2, tx) ─┼─► (id, outcome) ─► rx ─► wait_all() ─► BatchOutcome
//! add(wN) ─► task_then(wN, tx) ─┘
//! ```
//!
//! ## Rules
//! - Tasks run under the queue's usual limits; the batch holds no slots itself.
//! - Tasks still running at the deadline keep running; they are listed in
//!   [`BatchOutcome::pending`] and their outcome is dropped.
//! - A task the queue dropped without running (shutdown) is completed with
//!   [`TaskError::Lost`].
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use dispatchq::{Batch, DispatchQueue, QueueConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let queue = DispatchQueue::new(QueueConfig::new(64, 8));
//! let mut batch = Batch::new(&queue);
//! for n in 0..4u32 {
//!     batch.add(move || async move { Ok::<_, String>(n * n) }).await.unwrap();
//! }
//!
//! let outcome = batch.wait_all(Some(Duration::from_secs(1))).await;
//! assert!(outcome.pending.is_empty());
//! assert_eq!(outcome.completed.len(), 4);
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::core::DispatchQueue;
use crate::error::{SubmitError, TaskError};
use crate::tasks::TaskId;

type Report<T, E> = (TaskId, Result<T, TaskError<E>>);

/// Outcomes gathered by [`Batch::wait_all`].
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    /// Tasks that finished, keyed (and ordered) by id.
    pub completed: BTreeMap<TaskId, Result<T, TaskError<E>>>,
    /// Tasks without an outcome at the deadline, in submission order.
    pub pending: Vec<TaskId>,
}

impl<T, E> BatchOutcome<T, E> {
    /// True if every task finished successfully.
    pub fn all_ok(&self) -> bool {
        self.pending.is_empty() && self.completed.values().all(Result::is_ok)
    }
}

/// A group of detached tasks whose outcomes are awaited together.
pub struct Batch<'q, T, E> {
    queue: &'q DispatchQueue,
    tx: mpsc::UnboundedSender<Report<T, E>>,
    rx: mpsc::UnboundedReceiver<Report<T, E>>,
    ids: Vec<TaskId>,
}

impl<'q, T, E> Batch<'q, T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Creates an empty batch submitting to `queue`.
    pub fn new(queue: &'q DispatchQueue) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            queue,
            tx,
            rx,
            ids: Vec::new(),
        }
    }

    /// Submits one task (suspending on a full pending line) and tracks it.
    pub async fn add<F, Fut>(&mut self, work: F) -> Result<TaskId, SubmitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let id = self
            .queue
            .task_then(work, move |id, outcome| {
                let _ = tx.send((id, outcome));
            })
            .await?;
        self.ids.push(id);
        Ok(id)
    }

    /// Number of tasks added so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no task was added.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Waits until every task has reported, or until `timeout` elapses.
    pub async fn wait_all(self, timeout: Option<Duration>) -> BatchOutcome<T, E> {
        let Batch { tx, mut rx, ids, .. } = self;
        // Only the callbacks keep the channel open from here on.
        drop(tx);

        let deadline = timeout.map(|t| Instant::now() + t);
        let mut completed = BTreeMap::new();

        while completed.len() < ids.len() {
            let next = match deadline {
                Some(at) => match time::timeout_at(at, rx.recv()).await {
                    Ok(next) => next,
                    Err(_elapsed) => break,
                },
                None => rx.recv().await,
            };
            match next {
                Some((id, outcome)) => {
                    completed.insert(id, outcome);
                }
                None => break,
            }
        }

        let pending = ids
            .into_iter()
            .filter(|id| !completed.contains_key(id))
            .collect();
        BatchOutcome { completed, pending }
    }
}
