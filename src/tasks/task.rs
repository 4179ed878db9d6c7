//! # Task abstraction.
//!
//! A [`Task`] is one unit of work together with its completion protocol. The
//! dispatch queue only sees `Box<dyn Task>`; the two implementors decide what
//! happens with the outcome:
//!
//! - [`DetachedTask`](super::DetachedTask): hands the outcome to an optional finish callback.
//! - [`WaitTask`](super::WaitTask): sends the outcome to the single waiting submitter.
//!
//! ## Execution contract
//! ```text
//! dispatcher ──► spawn(task.execute(slot, bus))
//!                   ├─► run_once(work)          (failures and panics captured)
//!                   ├─► deliver outcome         (callback or result channel)
//!                   └─► slot released           (exactly once, also on unwind)
//! ```

use futures::future::BoxFuture;

use crate::core::AdmissionSlot;
use crate::events::Bus;

use super::id::{TaskId, TaskMode};

/// Owned, type-erased task as stored on the pending line.
pub(crate) type BoxTask = Box<dyn Task>;

/// Unit of work with a completion protocol.
pub(crate) trait Task: Send + 'static {
    /// Id assigned at construction.
    fn id(&self) -> TaskId;

    /// Which completion protocol the task follows.
    fn mode(&self) -> TaskMode;

    /// Forgets any pending notification before the task is dropped unexecuted.
    ///
    /// Called when the queue refuses the task, since the submitter already
    /// observes that as an error.
    fn disarm(&mut self) {}

    /// Runs the work and delivers its outcome.
    ///
    /// The returned future owns `slot` and must release it exactly once when it
    /// finishes. It is driven on a freshly spawned task, never on the
    /// dispatcher or the submitter.
    fn execute(self: Box<Self>, slot: AdmissionSlot, bus: Bus) -> BoxFuture<'static, ()>;
}
