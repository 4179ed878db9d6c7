//! # Process-wide dispatch queue.
//!
//! The global queue is created lazily by the first call that needs it
//! ([`global`], any submission function, [`stats`]). Until then, [`configure`]
//! may replace its capacities and subscribers.
//!
//! ```text
//! configure(cfg) ──► Bootstrap { config, subscribers, started: false }
//!                              │
//! first task()/global() ──► OnceLock::get_or_init
//!                              ├─► lock bootstrap
//!                              ├─► DispatchQueue::builder(config).build()
//!                              └─► started = true   (only once build returned)
//!
//! configure(cfg) after that ──► Err(AlreadyStarted) + ConfigureIgnored + stderr
//! ```
//!
//! ## Rules
//! - Exactly one global queue and one dispatcher exist per process, however many
//!   threads race on first access.
//! - A `configure` racing with first access is either applied or reported as
//!   ignored, never lost silently.
//! - A first access that panics (no runtime) consumes nothing; the next one
//!   builds from the same bootstrap.
//! - Every late `configure` is reported, valid or not.
//! - The global queue is never shut down.
//! - First access must happen inside a Tokio runtime; the dispatcher lives on
//!   that runtime.

use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use crate::error::{ConfigError, SubmitError, TaskError};
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use crate::tasks::TaskId;

use super::config::QueueConfig;
use super::queue::{DispatchQueue, QueueStats};

struct Bootstrap {
    config: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    started: bool,
}

static BOOTSTRAP: LazyLock<Mutex<Bootstrap>> = LazyLock::new(|| {
    Mutex::new(Bootstrap {
        config: QueueConfig::default(),
        subscribers: Vec::new(),
        started: false,
    })
});

static GLOBAL: OnceLock<Arc<DispatchQueue>> = OnceLock::new();

fn bootstrap() -> MutexGuard<'static, Bootstrap> {
    BOOTSTRAP.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sets the capacities of the global queue.
///
/// Must be called before the first submission. Afterwards the queue already
/// exists and its capacities are fixed: the call changes nothing, returns
/// [`ConfigError::AlreadyStarted`], publishes [`EventKind::ConfigureIgnored`]
/// and writes a warning to stderr.
///
/// # Example
/// ```
/// use dispatchq::{QueueConfig, configure};
///
/// configure(QueueConfig::new(1024, 64)).expect("configured before first use");
/// ```
pub fn configure(config: QueueConfig) -> Result<(), ConfigError> {
    configure_with_subscribers(config, Vec::new())
}

/// Like [`configure`], also attaching event subscribers to the global queue.
pub fn configure_with_subscribers(
    config: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
) -> Result<(), ConfigError> {
    {
        let mut boot = bootstrap();
        if !boot.started {
            config.validate()?;
            boot.config = config;
            boot.subscribers = subscribers;
            return Ok(());
        }
    }

    // Started: the queue is built and `global()` returns it.
    let queue = global();
    let current = queue.config();
    eprintln!(
        "[dispatchq] configure ignored: queue already running with pending_capacity={} admission_capacity={}",
        current.pending_capacity, current.admission_capacity
    );
    queue.bus.publish(Event::new(EventKind::ConfigureIgnored).with_reason(format!(
        "requested pending_capacity={} admission_capacity={}",
        config.pending_capacity, config.admission_capacity
    )));
    Err(ConfigError::AlreadyStarted {
        pending_capacity: current.pending_capacity,
        admission_capacity: current.admission_capacity,
    })
}

/// Returns the global queue, creating it on first access.
///
/// # Panics
/// Panics if first called outside a Tokio runtime. Nothing is consumed in that
/// case: configuration and subscribers stay in place for the next access.
pub fn global() -> &'static Arc<DispatchQueue> {
    GLOBAL.get_or_init(|| {
        // Held across `build()`: a racing `configure` waits, and a panicking
        // build leaves the bootstrap untouched for the next attempt.
        let mut boot = bootstrap();
        let queue = DispatchQueue::builder(boot.config.clone())
            .with_subscribers(boot.subscribers.clone())
            .build();
        boot.started = true;
        boot.subscribers.clear();
        queue
    })
}

/// Submits fire-and-forget work to the global queue. See [`DispatchQueue::task`].
pub async fn task<F, Fut, T, E>(work: F) -> Result<TaskId, SubmitError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    global().task(work).await
}

/// Submits fire-and-forget work with a finish callback to the global queue.
/// See [`DispatchQueue::task_then`].
pub async fn task_then<F, Fut, T, E, C>(work: F, on_finish: C) -> Result<TaskId, SubmitError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    C: FnOnce(TaskId, Result<T, TaskError<E>>) + Send + 'static,
{
    global().task_then(work, on_finish).await
}

/// Non-suspending variant of [`task`]. See [`DispatchQueue::try_task`].
pub fn try_task<F, Fut, T, E>(work: F) -> Result<TaskId, SubmitError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    global().try_task(work)
}

/// Submits work to the global queue and waits for its outcome.
/// See [`DispatchQueue::task_wait`].
pub async fn task_wait<F, Fut, T, E>(work: F, timeout: Option<Duration>) -> Result<T, TaskError<E>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    global().task_wait(work, timeout).await
}

/// Occupancy of the global queue: `(queued, overflow_producers, running)`.
pub fn stats() -> QueueStats {
    global().stats()
}
