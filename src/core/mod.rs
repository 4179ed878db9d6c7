//! Dispatch core: queue, dispatcher, execution and the global facade.
//!
//! The public API from this module is [`DispatchQueue`] (owned queues) and the
//! free functions operating on the process-wide instance.
//!
//! Internal modules:
//! - [`queue`]: pending line, admission line, stats, shutdown;
//! - [`submit`]: `task` / `task_then` / `try_task` / `task_wait` on a queue;
//! - [`dispatcher`]: the loop moving tasks from the pending line into execution;
//! - [`runner`]: executes one task's work and publishes its lifecycle events;
//! - [`admission`]: the slot guard held by every executing task;
//! - [`global`]: lazily built process-wide queue and `configure`.

mod admission;
mod builder;
mod config;
mod dispatcher;
mod global;
mod queue;
mod runner;
mod submit;

pub use builder::DispatchQueueBuilder;
pub use config::{DEFAULT_ADMISSION_CAPACITY, DEFAULT_PENDING_CAPACITY, QueueConfig};
pub use global::{configure, configure_with_subscribers, global, stats, task, task_then, task_wait, try_task};
pub use queue::{DispatchQueue, QueueStats};

pub(crate) use admission::AdmissionSlot;
pub(crate) use runner::{panic_message, run_once};
