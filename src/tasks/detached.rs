//! # Fire-and-forget task.
//!
//! [`DetachedTask`] runs its work and hands the outcome to an optional finish
//! callback, invoked on the same spawned task right after the work completes.
//!
//! ## Rules
//! - The callback receives `(id, Ok(value))` or `(id, Err(failure))`, never both.
//! - No callback + success: nothing to report.
//! - No callback + failure: the failure is written to stderr and published as
//!   [`EventKind::FailureUnobserved`]; it is never dropped silently.
//! - A panicking callback is caught and published as [`EventKind::FinishPanicked`].
//! - A task dropped without running (queue shut down) calls its callback with
//!   [`TaskError::Lost`]. A task refused at submission is disarmed first: its
//!   submitter already got the error.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::core::{AdmissionSlot, panic_message, run_once};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

use super::id::{TaskId, TaskMode};
use super::task::Task;

/// Callback invoked once a detached task has finished.
pub type FinishFn<T, E> = Box<dyn FnOnce(TaskId, Result<T, TaskError<E>>) + Send + 'static>;

/// Fire-and-forget task with an optional finish callback.
pub(crate) struct DetachedTask<F, T, E> {
    id: TaskId,
    work: F,
    on_finish: LostGuard<T, E>,
}

impl<F, T, E> DetachedTask<F, T, E> {
    pub(crate) fn new(work: F, on_finish: Option<FinishFn<T, E>>) -> Self {
        let id = TaskId::next();
        Self {
            id,
            work,
            on_finish: LostGuard { id, on_finish },
        }
    }
}

/// Holds the finish callback until execution takes it.
///
/// Dropped while still armed, it reports [`TaskError::Lost`].
struct LostGuard<T, E> {
    id: TaskId,
    on_finish: Option<FinishFn<T, E>>,
}

impl<T, E> LostGuard<T, E> {
    fn take(&mut self) -> Option<FinishFn<T, E>> {
        self.on_finish.take()
    }
}

impl<T, E> Drop for LostGuard<T, E> {
    fn drop(&mut self) {
        let Some(finish) = self.on_finish.take() else {
            return;
        };
        let id = self.id;
        let call = AssertUnwindSafe(move || finish(id, Err(TaskError::Lost { id })));
        if let Err(panic) = std::panic::catch_unwind(call) {
            eprintln!(
                "[dispatchq] finish callback of dropped task {id} panicked: {}",
                panic_message(panic.as_ref())
            );
        }
    }
}

impl<F, Fut, T, E> Task for DetachedTask<F, T, E>
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
        TaskMode::Detached
    }

    fn disarm(&mut self) {
        self.on_finish.take();
    }

    fn execute(self: Box<Self>, slot: AdmissionSlot, bus: Bus) -> BoxFuture<'static, ()> {
        let DetachedTask {
            id,
            work,
            on_finish: mut guard,
        } = *self;
        let on_finish = guard.take();

        async move {
            let outcome = run_once(id, TaskMode::Detached, work, &bus).await;

            match on_finish {
                Some(finish) => {
                    let call = AssertUnwindSafe(move || finish(id, outcome));
                    if let Err(panic) = std::panic::catch_unwind(call) {
                        let message = panic_message(panic.as_ref());
                        eprintln!("[dispatchq] finish callback of task {id} panicked: {message}");
                        bus.publish(
                            Event::new(EventKind::FinishPanicked)
                                .with_task(id)
                                .with_mode(TaskMode::Detached)
                                .with_reason(message),
                        );
                    }
                }
                None => {
                    if let Err(err) = &outcome {
                        eprintln!("[dispatchq] task {id} failed with no finish callback: {err}");
                        bus.publish(
                            Event::new(EventKind::FailureUnobserved)
                                .with_task(id)
                                .with_mode(TaskMode::Detached)
                                .with_reason(err.to_string()),
                        );
                    }
                }
            }

            slot.release();
        }
        .boxed()
    }
}
