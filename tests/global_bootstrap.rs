//! First access to the global queue from outside a runtime fails without
//! consuming the bootstrap. Separate binary: the global queue must not exist yet.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dispatchq::{ConfigError, Event, QueueConfig, Subscribe};

struct Counter(AtomicUsize);

#[async_trait]
impl Subscribe for Counter {
    async fn on_event(&self, _event: &Event) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn failed_first_access_keeps_bootstrap() {
    let counter = Arc::new(Counter(AtomicUsize::new(0)));
    dispatchq::configure_with_subscribers(
        QueueConfig::new(16, 3),
        vec![counter.clone() as Arc<dyn Subscribe>],
    )
    .unwrap();

    let outside = std::thread::spawn(dispatchq::stats).join();
    assert!(outside.is_err(), "building the queue without a runtime must fail");

    // Nothing started: configuration is still accepted.
    dispatchq::configure_with_subscribers(
        QueueConfig::new(32, 5),
        vec![counter.clone() as Arc<dyn Subscribe>],
    )
    .unwrap();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let n = dispatchq::task_wait(|| async { Ok::<_, String>(3) }, Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(n, 3);

        let cfg = dispatchq::global().config();
        assert_eq!((cfg.pending_capacity, cfg.admission_capacity), (32, 5));

        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.0.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("subscriber receives events");

        assert_eq!(
            dispatchq::configure(QueueConfig::new(1, 1)),
            Err(ConfigError::AlreadyStarted {
                pending_capacity: 32,
                admission_capacity: 5
            })
        );
    });
}
