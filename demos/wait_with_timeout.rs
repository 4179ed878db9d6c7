//! Waits on tasks with and without a deadline on the global queue.
//!
//! Run with: `cargo run --example wait_with_timeout`

use std::time::Duration;

use dispatchq::{QueueConfig, TaskError};

async fn lookup(key: &'static str, delay: Duration) -> Result<Option<u32>, String> {
    tokio::time::sleep(delay).await;
    match key {
        "answer" => Ok(Some(42)),
        "missing" => Ok(None),
        _ => Err(format!("unknown key {key:?}")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dispatchq::configure(QueueConfig::new(64, 4))?;
    let budget = Some(Duration::from_millis(100));

    for (key, delay) in [
        ("answer", Duration::from_millis(5)),
        ("missing", Duration::from_millis(5)),
        ("bogus", Duration::from_millis(5)),
        ("answer", Duration::from_millis(500)),
    ] {
        match dispatchq::task_wait(move || lookup(key, delay), budget).await {
            Ok(value) => println!("{key}: {value:?}"),
            Err(TaskError::Timeout { id, timeout }) => {
                println!("{key}: task {id} still running after {timeout:?}")
            }
            Err(err) => println!("{key}: {err} ({})", err.as_label()),
        }
    }

    let (queued, overflow, running): (usize, usize, usize) = dispatchq::stats().into();
    println!("queued={queued} overflow={overflow} running={running}");
    Ok(())
}
