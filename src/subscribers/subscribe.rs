//! # Event subscriber trait.
//!
//! [`Subscribe`] is the hook for logging, metrics or auditing of dispatch
//! activity. Each subscriber is driven by its own worker fed by a bounded queue
//! owned by the [`SubscriberSet`](super::SubscriberSet).
//!
//! ## Rules
//! - A slow subscriber only fills its own queue; the dispatcher and tasks never wait on it.
//! - On overflow the event is dropped for that subscriber and
//!   `EventKind::SubscriberOverflow` is published.
//! - Panics are caught and published as `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use dispatchq::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskFailed {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
