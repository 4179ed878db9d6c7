//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the dispatcher loop, `DispatchQueue::submit`, `task_wait`,
//!   executing tasks, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener started by the queue builder, and
//!   any receiver obtained from `DispatchQueue::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
