//! # Tasks and their completion protocols.
//!
//! - [`TaskId`] process-unique id assigned at construction
//! - [`TaskMode`] detached (fire-and-forget) or wait
//! - `Task` crate-internal trait the dispatch queue executes
//! - `DetachedTask` / `WaitTask` the two completion protocols
//! - [`FinishFn`] callback type for detached tasks

mod detached;
mod id;
mod task;
mod wait;

pub use detached::FinishFn;
pub use id::{TaskId, TaskMode};

pub(crate) use detached::DetachedTask;
pub(crate) use task::{BoxTask, Task};
pub(crate) use wait::WaitTask;
