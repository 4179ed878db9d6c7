//! # Wait task.
//!
//! [`WaitTask`] owns the sending half of a single-use result channel. The
//! submitter keeps the receiving half and awaits it, optionally with a timeout.
//!
//! Exactly one value is ever sent: `Ok(value)` or `Err(failure)`. Because the
//! value travels inside `Ok`, a legitimate `false`, `None` or `()` can never be
//! confused with a timeout, which is observed by the receiver alone.
//!
//! If the submitter stopped waiting, the send fails and the outcome is discarded
//! ([`EventKind::ResultDiscarded`]). The task itself is never interrupted.

use std::fmt::Display;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::core::{AdmissionSlot, run_once};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

use super::id::{TaskId, TaskMode};
use super::task::Task;

/// Receiving half held by the submitter of a [`WaitTask`].
pub(crate) type ResultReceiver<T, E> = oneshot::Receiver<Result<T, TaskError<E>>>;

/// Task whose outcome is delivered to one waiting submitter.
pub(crate) struct WaitTask<F, T, E> {
    id: TaskId,
    work: F,
    result_tx: oneshot::Sender<Result<T, TaskError<E>>>,
}

impl<F, T, E> WaitTask<F, T, E> {
    /// Creates the task and the receiver its outcome will arrive on.
    pub(crate) fn new(work: F) -> (Self, ResultReceiver<T, E>) {
        let (result_tx, result_rx) = oneshot::channel();
        let task = Self {
            id: TaskId::next(),
            work,
            result_tx,
        };
        (task, result_rx)
    }
}

impl<F, Fut, T, E> Task for WaitTask<F, T, E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    fn id(&self) -> TaskId {
        self.id
    }

    fn mode(&self) -> TaskMode {
        TaskMode::Wait
    }

    fn execute(self: Box<Self>, slot: AdmissionSlot, bus: Bus) -> BoxFuture<'static, ()> {
        let WaitTask { id, work, result_tx } = *self;

        async move {
            let outcome = run_once(id, TaskMode::Wait, work, &bus).await;

            if result_tx.send(outcome).is_err() {
                bus.publish(
                    Event::new(EventKind::ResultDiscarded)
                        .with_task(id)
                        .with_mode(TaskMode::Wait),
                );
            }

            slot.release();
        }
        .boxed()
    }
}
