use std::sync::Arc;

use tokio::sync::{Semaphore, broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::BoxTask;

use super::config::QueueConfig;
use super::dispatcher::Dispatcher;
use super::queue::DispatchQueue;

/// Builder for constructing a [`DispatchQueue`] with optional subscribers.
pub struct DispatchQueueBuilder {
    cfg: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl DispatchQueueBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: QueueConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive queue and task events through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the queue and starts its dispatcher.
    ///
    /// Capacities of zero are clamped to 1. Must be called inside a Tokio runtime.
    pub fn build(self) -> Arc<DispatchQueue> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_subscriber_listener(bus.subscribe(), set, token.clone());
        }

        let (tx, rx) = mpsc::channel::<BoxTask>(self.cfg.pending_capacity_clamped());
        let admission = Arc::new(Semaphore::new(self.cfg.admission_capacity_clamped()));

        let dispatcher = Dispatcher::new(rx, admission.clone(), bus.clone(), token.clone());
        tokio::spawn(dispatcher.run());

        Arc::new(DispatchQueue::new_internal(self.cfg, bus, tx, admission, token))
    }
}

/// Forwards bus events to the subscriber set until the queue shuts down.
///
/// Events already buffered at shutdown are still delivered.
fn spawn_subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        eprintln!("[dispatchq] subscriber listener lagged, skipped {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        while let Ok(ev) = rx.try_recv() {
            set.emit(ev);
        }
        set.shutdown().await;
    });
}
