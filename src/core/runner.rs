//! # Run the work of a single task.
//!
//! [`run_once`] invokes a task's work inside a failure-capturing scope and
//! publishes lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:  TaskStarting → work() → Ok(v)   → TaskCompleted
//! Failure:  TaskStarting → work() → Err(e)  → TaskFailed     → Err(Failed { e })
//! Panic:    TaskStarting → work() → panic   → TaskFailed     → Err(Panicked { msg })
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `TaskCompleted` or `TaskFailed`.
//! - A panic is caught whether it happens while building the future or while polling it.
//! - The application error is returned as-is, only its `Display` form goes on the bus.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskId, TaskMode};

/// Runs `work` to completion and converts its outcome into the submitter-facing result.
pub(crate) async fn run_once<F, Fut, T, E>(
    id: TaskId,
    mode: TaskMode,
    work: F,
    bus: &Bus,
) -> Result<T, TaskError<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    bus.publish(Event::new(EventKind::TaskStarting).with_task(id).with_mode(mode));

    let captured = AssertUnwindSafe(async move { work().await })
        .catch_unwind()
        .await;

    match captured {
        Ok(Ok(value)) => {
            bus.publish(Event::new(EventKind::TaskCompleted).with_task(id).with_mode(mode));
            Ok(value)
        }
        Ok(Err(error)) => {
            publish_failed(bus, id, mode, error.to_string());
            Err(TaskError::Failed { id, error })
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            publish_failed(bus, id, mode, format!("panicked: {message}"));
            Err(TaskError::Panicked { id, message })
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn publish_failed(bus: &Bus, id: TaskId, mode: TaskMode, reason: String) {
    bus.publish(
        Event::new(EventKind::TaskFailed)
            .with_task(id)
            .with_mode(mode)
            .with_reason(reason),
    );
}
