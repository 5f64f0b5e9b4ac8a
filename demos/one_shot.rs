//! # Example: one_shot
//!
//! Schedules three delayed tasks and shows they fire in delay order.
//!
//! Shows how to:
//! - Build a [`TaskSpec`] with a delay and a completion callback
//! - Schedule a batch with [`Scheduler::schedule_all`]
//! - Inspect live tasks with [`Scheduler::list_tasks`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► schedule_all([slow 900ms, medium 600ms, fast 300ms])
//!   ├─► list_tasks()            → 3 pending
//!   ├─► fast → medium → slow    (each prints, then on_complete)
//!   └─► is_empty()              → true
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example one_shot
//! ```

use std::time::Duration;

use taskdefer::{Scheduler, SchedulerConfig, TaskError, TaskFn, TaskRef, TaskSpec, TimeUnit};
use tokio_util::sync::CancellationToken;

fn say(word: &'static str) -> TaskRef {
    TaskFn::arc(move |_ctx: CancellationToken| async move {
        println!("[{word}] fired");
        Ok::<(), TaskError>(())
    })
}

fn spec(id: &'static str, delay_ms: i64) -> TaskSpec {
    TaskSpec::builder(id)
        .with_work(say(id))
        .with_delay(delay_ms, TimeUnit::Milliseconds)
        .on_complete(move || println!("[{id}] completed"))
        .build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== one_shot example ===\n");

    let sched = Scheduler::new(SchedulerConfig::default());
    sched
        .schedule_all(Some([spec("slow", 900), spec("medium", 600), spec("fast", 300)]))
        .await?;

    let mut live: Vec<_> = sched.list_tasks().await.into_keys().collect();
    live.sort();
    println!("live tasks: {live:?}\n");

    tokio::time::sleep(Duration::from_secs(1)).await;
    anyhow::ensure!(sched.is_empty().await, "all tasks should have completed");

    println!("\n=== done ===");
    Ok(())
}
