//! # Event bus.
//!
//! [`Bus`] wraps a [`tokio::sync::broadcast`] sender. The dispatcher, the
//! submission API and every executing task publish through clones of it.
//!
//! ```text
//! submit()     ──┐
//! dispatcher   ──┼──► Bus ──► subscriber listener ──► SubscriberSet
//! task execute ──┘    └────► Receiver from DispatchQueue::subscribe()
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - A receiver that falls behind gets `RecvError::Lagged(n)` and skips `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable broadcast channel for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
