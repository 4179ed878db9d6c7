//! # Submission API of [`DispatchQueue`].
//!
//! | method        | suspends on full line | returns                         |
//! |---------------|-----------------------|---------------------------------|
//! | `task`        | yes                   | id once enqueued                |
//! | `task_then`   | yes                   | id once enqueued                |
//! | `try_task`    | no (`Full`)           | id once enqueued                |
//! | `task_wait`   | yes                   | the task's value or failure     |
//!
//! Parameters are bound by capturing them in the `work` closure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::error::{SubmitError, TaskError};
use crate::events::{Event, EventKind};
use crate::tasks::{DetachedTask, FinishFn, Task, TaskId, TaskMode, WaitTask};

use super::queue::DispatchQueue;

impl DispatchQueue {
    /// Submits fire-and-forget work.
    ///
    /// Returns once the task is on the pending line; never waits for it to run.
    /// A failure with nobody to observe it is written to stderr and published as
    /// [`EventKind::FailureUnobserved`].
    pub async fn task<F, Fut, T, E>(&self, work: F) -> Result<TaskId, SubmitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let task = DetachedTask::<F, T, E>::new(work, None);
        let id = task.id();
        self.submit(Box::new(task)).await?;
        Ok(id)
    }

    /// Submits fire-and-forget work with a finish callback.
    ///
    /// `on_finish` runs right after the work, on the same task, with
    /// `(id, Ok(value))` or `(id, Err(failure))`.
    pub async fn task_then<F, Fut, T, E, C>(&self, work: F, on_finish: C) -> Result<TaskId, SubmitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        C: FnOnce(TaskId, Result<T, TaskError<E>>) + Send + 'static,
    {
        let on_finish: FinishFn<T, E> = Box::new(on_finish);
        let task = DetachedTask::new(work, Some(on_finish));
        let id = task.id();
        self.submit(Box::new(task)).await?;
        Ok(id)
    }

    /// Submits fire-and-forget work without suspending.
    ///
    /// Fails with [`SubmitError::Full`] when the pending line is full.
    pub fn try_task<F, Fut, T, E>(&self, work: F) -> Result<TaskId, SubmitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let task = DetachedTask::<F, T, E>::new(work, None);
        let id = task.id();
        self.try_submit(Box::new(task))?;
        Ok(id)
    }

    /// Submits work and waits for its outcome.
    ///
    /// With `timeout = None` waits as long as it takes. With `Some(d)` the
    /// deadline is `d` after the call, time spent suspended on a full pending
    /// line included. On timeout the task is **not** cancelled: it keeps its
    /// admission slot until it finishes, and its result is discarded.
    ///
    /// # Errors
    /// - [`TaskError::Failed`] / [`TaskError::Panicked`]: the work failed
    /// - [`TaskError::Timeout`]: nothing arrived before the deadline
    /// - [`TaskError::Lost`]: the queue dropped the task before it ran
    /// - [`TaskError::AddTaskFailed`]: the queue is closed
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use dispatchq::{DispatchQueue, QueueConfig};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let queue = DispatchQueue::new(QueueConfig::new(16, 4));
    /// let n = queue
    ///     .task_wait(|| async { Ok::<_, String>(6 * 7) }, Some(Duration::from_secs(1)))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(n, 42);
    /// # }
    /// ```
    pub async fn task_wait<F, Fut, T, E>(
        &self,
        work: F,
        timeout: Option<Duration>,
    ) -> Result<T, TaskError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let started = Instant::now();
        let (task, rx) = WaitTask::new(work);
        let id = task.id();
        self.submit(Box::new(task)).await?;

        let Some(budget) = timeout else {
            return rx.await.unwrap_or_else(|_closed| Err(TaskError::Lost { id }));
        };

        let remaining = budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(self.timed_out(id, budget));
        }

        match time::timeout(remaining, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_closed)) => Err(TaskError::Lost { id }),
            Err(_elapsed) => Err(self.timed_out(id, budget)),
        }
    }

    fn timed_out<E>(&self, id: TaskId, timeout: Duration) -> TaskError<E> {
        self.bus.publish(
            Event::new(EventKind::WaitTimedOut)
                .with_task(id)
                .with_mode(TaskMode::Wait)
                .with_timeout(timeout),
        );
        TaskError::Timeout { id, timeout }
    }
}
