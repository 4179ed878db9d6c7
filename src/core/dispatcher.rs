//! # Dispatcher: drains the pending line into admission slots.
//!
//! One dispatcher runs per [`DispatchQueue`](super::DispatchQueue), started by
//! the builder and living as long as the queue.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► pop task from pending line        (suspends while empty)
//!   ├─► acquire admission slot            (suspends at admission_capacity)
//!   ├─► spawn(task.execute(slot, bus))    (fresh task, not awaited)
//!   └─► next iteration
//! }
//! ```
//!
//! ## Exit conditions
//! - queue shut down or dropped → `DispatcherStopped`
//! - admission line closed → `DispatcherDead` (broken invariant: only the
//!   dispatcher touches the semaphore, and nothing closes it)
//!
//! In both cases the pending line is closed first, so producers fail with
//! `AddTaskFailed` instead of suspending forever. Tasks that were still
//! buffered, or popped but not yet admitted, are dropped and report
//! `TaskError::Lost` to their waiter or finish callback.

use std::sync::Arc;

use tokio::select;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::BoxTask;

use super::admission::AdmissionSlot;

/// Consumer side of a dispatch queue.
pub(crate) struct Dispatcher {
    pending: mpsc::Receiver<BoxTask>,
    admission: Arc<Semaphore>,
    bus: Bus,
    token: CancellationToken,
}

impl Dispatcher {
    pub(crate) fn new(
        pending: mpsc::Receiver<BoxTask>,
        admission: Arc<Semaphore>,
        bus: Bus,
        token: CancellationToken,
    ) -> Self {
        Self {
            pending,
            admission,
            bus,
            token,
        }
    }

    /// Runs until the queue is shut down or an invariant breaks.
    pub(crate) async fn run(mut self) {
        self.bus.publish(Event::new(EventKind::DispatcherStarted));

        loop {
            let task = select! {
                biased;
                _ = self.token.cancelled() => break,
                next = self.pending.recv() => match next {
                    Some(task) => task,
                    None => break,
                },
            };

            let acquired = select! {
                biased;
                _ = self.token.cancelled() => break,
                res = self.admission.clone().acquire_owned() => res,
            };
            let Ok(permit) = acquired else {
                self.abort("admission line closed while dispatching");
                return;
            };

            let slot = AdmissionSlot::new(permit);
            tokio::spawn(task.execute(slot, self.bus.clone()));
        }

        self.pending.close();
        self.bus.publish(Event::new(EventKind::DispatcherStopped));
    }

    fn abort(&mut self, reason: &'static str) {
        self.pending.close();
        eprintln!("[dispatchq] dispatcher aborted: {reason}");
        self.bus
            .publish(Event::new(EventKind::DispatcherDead).with_reason(reason));
    }
}
