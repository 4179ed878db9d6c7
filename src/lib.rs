//! # dispatchq
//!
//! **dispatchq** is a bounded, admission-limited task dispatch queue for Tokio.
//!
//! Callers submit async work either fire-and-forget or wait-for-result (with an
//! optional timeout). The queue applies backpressure to producers once its
//! pending line is full and never executes more than `admission_capacity`
//! tasks at the same time.
//!
//! ## Architecture
//! ```text
//!   producer         producer         producer
//!   task(w)          task_then(w,cb)  task_wait(w, timeout)
//!      │                 │                 │
//!      ▼                 ▼                 ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ pending line (mpsc, pending_capacity)                │ full → producer suspends
//! └─────────────────────────┬────────────────────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │     Dispatcher      │ pop → acquire slot → spawn
//!                └──────────┬──────────┘
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ admission line (semaphore, admission_capacity)       │ full → dispatcher suspends
//! └───────┬──────────────────┬──────────────────┬────────┘
//!         ▼                  ▼                  ▼
//!   execute(slot)      execute(slot)      execute(slot)
//!     │ callback         │ callback         │ oneshot ──► waiting producer
//!     ▼                  ▼                  ▼
//!                  slot released on exit
//!
//! every component ──► Bus (broadcast) ──► SubscriberSet ──► Subscribe::on_event
//! ```
//!
//! ## Features
//! | Area              | Description                                            | Key types / functions                         |
//! |-------------------|--------------------------------------------------------|-----------------------------------------------|
//! | **Submission**    | Fire-and-forget, callback, non-blocking, wait+timeout  | [`task`], [`task_then`], [`try_task`], [`task_wait`] |
//! | **Queues**        | Process-wide queue or independently owned ones         | [`global`], [`DispatchQueue`]                 |
//! | **Configuration** | Capacities, set once before first use                  | [`QueueConfig`], [`configure`]                |
//! | **Batches**       | Await the outcomes of a group of detached tasks        | [`Batch`], [`BatchOutcome`]                   |
//! | **Subscriber API**| Hook into queue and task events                        | [`Subscribe`], [`Event`], [`EventKind`]       |
//! | **Errors**        | Typed errors for submission, execution, configuration  | [`SubmitError`], [`TaskError`], [`ConfigError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` _(demo/reference only)_.
//!
//! ## Cooperative scheduling
//! Tasks only yield at `.await` points. Long computations without an `.await`
//! hold their worker thread; split them up or move them to `spawn_blocking`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use dispatchq::{QueueConfig, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dispatchq::configure(QueueConfig::new(1024, 64))?;
//!
//!     // Fire and forget: returns once queued.
//!     let id = dispatchq::task(|| async {
//!         println!("hello from a detached task");
//!         Ok::<_, String>(())
//!     })
//!     .await?;
//!     println!("queued task {id}");
//!
//!     // Wait for a value, with a deadline.
//!     let user = "ada".to_string();
//!     let greeting = dispatchq::task_wait(
//!         move || async move { Ok::<_, String>(format!("hi {user}")) },
//!         Some(Duration::from_secs(1)),
//!     )
//!     .await?;
//!     assert_eq!(greeting, "hi ada");
//!
//!     // A timeout only stops the waiting, never the task.
//!     let slow = dispatchq::task_wait(
//!         || async {
//!             tokio::time::sleep(Duration::from_millis(200)).await;
//!             Ok::<_, String>(())
//!         },
//!         Some(Duration::from_millis(10)),
//!     )
//!     .await;
//!     assert!(matches!(slow, Err(TaskError::Timeout { .. })));
//!     Ok(())
//! }
//! ```
mod batch;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use batch::{Batch, BatchOutcome};
pub use core::{
    DEFAULT_ADMISSION_CAPACITY, DEFAULT_PENDING_CAPACITY, DispatchQueue,
    DispatchQueueBuilder, QueueConfig, QueueStats,
};
pub use core::{configure, configure_with_subscribers, global, stats, task, task_then, task_wait, try_task};
pub use error::{ConfigError, SubmitError, TaskError};
pub use events::{Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{FinishFn, TaskId, TaskMode};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
