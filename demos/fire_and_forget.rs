//! Fire-and-forget submissions with the built-in event printer attached.
//!
//! Run with: `cargo run --example fire_and_forget --features logging`

use std::sync::Arc;
use std::time::Duration;

use dispatchq::{Batch, DispatchQueue, LogWriter, QueueConfig, Subscribe};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let queue = DispatchQueue::builder(QueueConfig::new(4, 2))
        .with_subscribers(subs)
        .build();

    // No callback: a failure is reported on stderr and as an event.
    queue
        .task(|| async { Err::<(), _>("connection refused".to_string()) })
        .await?;

    // Callback: runs on the task right after the work.
    queue
        .task_then(
            || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, String>("report.csv")
            },
            |id, outcome| println!("task {id} finished: {outcome:?}"),
        )
        .await?;

    let mut batch = Batch::new(&queue);
    for n in 1..=6u64 {
        batch
            .add(move || async move {
                tokio::time::sleep(Duration::from_millis(10 * n)).await;
                Ok::<_, String>(n * 100)
            })
            .await?;
    }
    let outcome = batch.wait_all(Some(Duration::from_millis(45))).await;
    println!(
        "batch: {} completed, {} still running",
        outcome.completed.len(),
        outcome.pending.len()
    );

    queue.shutdown();
    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(())
}
