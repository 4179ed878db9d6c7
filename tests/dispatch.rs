use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dispatchq::{
    Batch, DispatchQueue, Event, EventKind, QueueConfig, Subscribe, SubmitError, TaskError, TaskMode,
};
use tokio::sync::{oneshot, watch};
use tokio::time::{self, Instant};

/// Polls `cond` until it holds, failing the test after a generous deadline.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    time::timeout(Duration::from_secs(5), async {
        while !cond() {
            time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(start_paused = true)]
async fn admission_capacity_is_never_exceeded() {
    let queue = DispatchQueue::new(QueueConfig::new(64, 3));
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut batch = Batch::new(&queue);
    for _ in 0..20 {
        let (current, peak) = (current.clone(), peak.clone());
        batch
            .add(move || async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(())
            })
            .await
            .unwrap();
    }

    let outcome = batch.wait_all(None).await;
    assert!(outcome.all_ok());
    assert_eq!(outcome.completed.len(), 20);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    wait_until(|| queue.stats().running == 0).await;
}

#[tokio::test]
async fn full_pending_line_suspends_producers() {
    let queue = DispatchQueue::new(QueueConfig::new(2, 1));
    let (gate_tx, gate_rx) = watch::channel(false);
    let finished = Arc::new(AtomicUsize::new(0));

    let producer = {
        let queue = queue.clone();
        let finished = finished.clone();
        tokio::spawn(async move {
            for _ in 0..6 {
                let mut gate = gate_rx.clone();
                let finished = finished.clone();
                queue
                    .task(move || async move {
                        let _ = gate.wait_for(|open| *open).await;
                        finished.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(())
                    })
                    .await
                    .unwrap();
            }
        })
    };

    wait_until(|| queue.stats().overflow_producers > 0).await;
    let stalled = queue.stats();
    assert_eq!(stalled.running, 1);
    assert!(queue.is_full());
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    gate_tx.send(true).unwrap();
    producer.await.unwrap();
    wait_until(|| finished.load(Ordering::SeqCst) == 6).await;
    wait_until(|| queue.stats() == Default::default()).await;
}

#[tokio::test]
async fn wait_returns_false_as_a_value() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 2));
    let res = queue
        .task_wait(|| async { Ok::<_, String>(false) }, Some(Duration::from_millis(500)))
        .await;
    assert!(matches!(res, Ok(false)));
}

#[tokio::test(start_paused = true)]
async fn wait_timeout_leaves_task_running() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 2));
    let mut events = queue.subscribe();
    let side_effect = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let effect = side_effect.clone();
    let res = queue
        .task_wait(
            move || async move {
                time::sleep(Duration::from_secs(1)).await;
                effect.store(1, Ordering::SeqCst);
                Ok::<_, String>("done")
            },
            Some(Duration::from_millis(10)),
        )
        .await;

    match res {
        Err(TaskError::Timeout { timeout, .. }) => assert_eq!(timeout, Duration::from_millis(10)),
        other => panic!("expected timeout, got {other:?}"),
    }
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(10) && waited < Duration::from_millis(50));
    assert_eq!(side_effect.load(Ordering::SeqCst), 0);

    time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(side_effect.load(Ordering::SeqCst), 1);

    let mut kinds = Vec::new();
    while let Ok(ev) = events.try_recv() {
        kinds.push(ev.kind);
    }
    assert!(kinds.contains(&EventKind::WaitTimedOut));
    assert!(kinds.contains(&EventKind::ResultDiscarded));
}

#[derive(Debug, PartialEq)]
struct Refused(u16);

impl std::fmt::Display for Refused {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "refused with {}", self.0)
    }
}

#[tokio::test]
async fn wait_reraises_the_same_failure() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 2));
    let res: Result<u8, _> = queue.task_wait(|| async { Err(Refused(503)) }, None).await;

    match res {
        Err(TaskError::Failed { error, .. }) => assert_eq!(error, Refused(503)),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_reports_panics() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 2));
    let res: Result<u8, TaskError<String>> = queue
        .task_wait(
            || async {
                let explode = true;
                if explode {
                    panic!("work exploded");
                }
                Ok(0)
            },
            None,
        )
        .await;

    match res {
        Err(TaskError::Panicked { message, .. }) => assert!(message.contains("work exploded")),
        other => panic!("expected panic, got {other:?}"),
    }
    wait_until(|| queue.stats().running == 0).await;
}

#[tokio::test]
async fn finish_callback_receives_id_and_failure() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 2));
    let (tx, rx) = oneshot::channel();

    let id = queue
        .task_then(
            || async { Err::<(), _>(Refused(429)) },
            move |id, outcome| {
                let _ = tx.send((id, outcome));
            },
        )
        .await
        .unwrap();

    let (reported, outcome) = rx.await.unwrap();
    assert_eq!(reported, id);
    assert_eq!(outcome.unwrap_err().into_failure(), Some(Refused(429)));
}

#[tokio::test]
async fn panicking_callback_still_releases_slot() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 1));
    let mut events = queue.subscribe();

    queue
        .task_then(|| async { Ok::<_, String>(1) }, |_, _| panic!("callback exploded"))
        .await
        .unwrap();

    let ev = time::timeout(Duration::from_secs(1), async {
        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::FinishPanicked {
                break ev;
            }
        }
    })
    .await
    .unwrap();
    assert!(ev.reason.as_deref().unwrap_or_default().contains("callback exploded"));

    // The single slot is free again.
    let n = queue
        .task_wait(|| async { Ok::<_, String>(2) }, Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(n, 2);
}

#[tokio::test]
async fn ids_strictly_increase() {
    let queue = DispatchQueue::new(QueueConfig::new(32, 4));
    let mut last = None;
    for _ in 0..10 {
        let id = queue.task(|| async { Ok::<_, String>(()) }).await.unwrap();
        if let Some(prev) = last {
            assert!(id > prev);
        }
        last = Some(id);
    }
}

#[tokio::test]
async fn try_task_reports_full_line() {
    let queue = DispatchQueue::new(QueueConfig::new(2, 1));
    assert!(queue.try_task(|| async { Ok::<_, String>(()) }).is_ok());
    assert!(queue.try_task(|| async { Ok::<_, String>(()) }).is_ok());
    assert_eq!(
        queue.try_task(|| async { Ok::<_, String>(()) }),
        Err(SubmitError::Full)
    );
}

#[tokio::test]
async fn shutdown_drops_buffered_tasks() {
    let queue = DispatchQueue::new(QueueConfig::new(4, 1));
    let mut events = queue.subscribe();
    let (gate_tx, gate_rx) = watch::channel(false);

    let mut gate = gate_rx.clone();
    queue
        .task(move || async move {
            let _ = gate.wait_for(|open| *open).await;
            Ok::<_, String>(())
        })
        .await
        .unwrap();
    wait_until(|| queue.stats().running == 1).await;

    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.task_wait(|| async { Ok::<_, String>(()) }, None).await })
    };
    time::timeout(Duration::from_secs(1), async {
        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::TaskQueued && ev.mode == Some(TaskMode::Wait) {
                break;
            }
        }
    })
    .await
    .unwrap();

    queue.shutdown();
    assert!(matches!(waiter.await.unwrap(), Err(TaskError::Lost { .. })));
    assert_eq!(
        queue.task(|| async { Ok::<_, String>(()) }).await,
        Err(SubmitError::AddTaskFailed)
    );

    // The task that was already executing is unaffected.
    gate_tx.send(true).unwrap();
    wait_until(|| queue.stats().running == 0).await;
}

#[tokio::test]
async fn shutdown_reports_lost_to_finish_callbacks() {
    let queue = DispatchQueue::new(QueueConfig::new(4, 1));
    let (gate_tx, gate_rx) = watch::channel(false);

    let mut gate = gate_rx.clone();
    queue
        .task(move || async move {
            let _ = gate.wait_for(|open| *open).await;
            Ok::<_, String>(())
        })
        .await
        .unwrap();
    wait_until(|| queue.stats().running == 1).await;

    let (tx, rx) = oneshot::channel();
    let id = queue
        .task_then(
            || async { Ok::<_, String>(1) },
            move |id, outcome| {
                let _ = tx.send((id, outcome));
            },
        )
        .await
        .unwrap();

    queue.shutdown();
    let (reported, outcome) = time::timeout(Duration::from_secs(1), rx)
        .await
        .expect("callback in time")
        .expect("callback invoked, not dropped");
    assert_eq!(reported, id);
    assert!(matches!(outcome, Err(TaskError::Lost { id: lost }) if lost == id));

    // Refused at submission: the error goes to the submitter only.
    let (tx, mut rx) = oneshot::channel::<()>();
    let refused = queue
        .task_then(
            || async { Ok::<_, String>(2) },
            move |_, _| {
                let _ = tx.send(());
            },
        )
        .await;
    assert_eq!(refused, Err(SubmitError::AddTaskFailed));
    assert!(matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Closed)));

    gate_tx.send(true).unwrap();
    wait_until(|| queue.stats().running == 0).await;
}

#[tokio::test]
async fn batch_sees_shutdown_as_lost() {
    let queue = DispatchQueue::new(QueueConfig::new(4, 1));
    let (gate_tx, gate_rx) = watch::channel(false);

    let mut batch = Batch::new(&queue);
    let mut gate = gate_rx.clone();
    let running = batch
        .add(move || async move {
            let _ = gate.wait_for(|open| *open).await;
            Ok::<_, String>(())
        })
        .await
        .unwrap();
    wait_until(|| queue.stats().running == 1).await;
    let dropped = batch.add(|| async { Ok::<_, String>(()) }).await.unwrap();

    queue.shutdown();
    gate_tx.send(true).unwrap();

    let outcome = batch.wait_all(Some(Duration::from_secs(1))).await;
    assert!(outcome.pending.is_empty());
    assert!(outcome.completed[&running].is_ok());
    assert!(matches!(outcome.completed[&dropped], Err(TaskError::Lost { .. })));
}

struct Recorder(Mutex<Vec<Event>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn subscribers_see_task_lifecycle() {
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let queue = DispatchQueue::builder(QueueConfig::new(8, 2))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build();

    let id = queue.task(|| async { Ok::<_, String>(()) }).await.unwrap();

    wait_until(|| {
        recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.kind == EventKind::TaskCompleted && e.task == Some(id))
    })
    .await;

    let seen: Vec<EventKind> = recorder
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.task == Some(id))
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        seen,
        vec![EventKind::TaskQueued, EventKind::TaskStarting, EventKind::TaskCompleted]
    );
}

#[tokio::test]
async fn unobserved_failure_is_published() {
    let queue = DispatchQueue::new(QueueConfig::new(8, 2));
    let mut events = queue.subscribe();

    let id = queue
        .task(|| async { Err::<(), _>("nobody listens".to_string()) })
        .await
        .unwrap();

    let ev = time::timeout(Duration::from_secs(1), async {
        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::FailureUnobserved {
                break ev;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(ev.task, Some(id));
    assert!(ev.reason.as_deref().unwrap_or_default().contains("nobody listens"));
}
