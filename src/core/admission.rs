//! # Admission slots.
//!
//! The admission line is a counting semaphore with `admission_capacity` permits.
//! The dispatcher acquires one permit per task before spawning it; the permit
//! travels into the execution as an [`AdmissionSlot`].
//!
//! ## Invariants
//! - A slot is returned to the admission line **exactly once**, when it is
//!   released or dropped. Dropping during unwind also returns it.
//! - Nothing but the dispatcher creates slots, so the number of held slots is
//!   the number of executing tasks.
//!
//! Slots never leave the crate:
//! ```compile_fail
//! use dispatchq::AdmissionSlot;
//! ```

use tokio::sync::OwnedSemaphorePermit;

/// One unit of execution capacity held by a running task.
#[derive(Debug)]
pub(crate) struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionSlot {
    pub(crate) fn new(permit: OwnedSemaphorePermit) -> Self {
        Self { _permit: permit }
    }

    /// Returns the slot to the admission line.
    ///
    /// Consumes the slot, so it cannot be released twice.
    #[inline]
    pub(crate) fn release(self) {
        drop(self);
    }
}
