//! # Example: retry_and_cancel
//!
//! Demonstrates bounded retries and cancellation with the built-in [`LogWriter`].
//!
//! Shows how to:
//! - Attach [`LogWriter`] and a `tracing` subscriber to watch events
//! - Let a flaky task succeed within its retry budget
//! - Cancel a pending task and receive `on_cancelled`
//! - Toggle cancellation off at runtime with [`FeatureFlags`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► schedule "flaky"   (fails twice, retries = 3)
//!   │     └─► scheduled → fired → failed → retry → ... → completed
//!   ├─► schedule "cleanup" (delay 5s)
//!   ├─► disable cancellation → cancel("cleanup") = FeatureDisabled
//!   ├─► enable cancellation  → cancel("cleanup") = true → on_cancelled
//!   └─► shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example retry_and_cancel --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskdefer::{
    Feature, FeatureFlags, LogWriter, ScheduleError, Scheduler, SchedulerConfig, Subscribe,
    TaskError, TaskFn, TaskRef, TaskSpec, TimeUnit,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let flags = Arc::new(FeatureFlags::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let sched = Scheduler::builder(SchedulerConfig::default())
        .with_subscribers(subs)
        .with_features(flags.clone())
        .build();

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let flaky: TaskRef = TaskFn::arc(move |_ctx: CancellationToken| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n < 3 {
                return Err(TaskError::fail(format!("upstream unavailable (call {n})")));
            }
            Ok(())
        }
    });
    sched
        .schedule(
            TaskSpec::builder("flaky")
                .with_work(flaky)
                .with_delay(200, TimeUnit::Milliseconds)
                .with_retries(3)
                .on_complete(|| println!("[flaky] on_complete"))
                .build(),
        )
        .await?;

    let cleanup: TaskRef = TaskFn::arc(|_ctx: CancellationToken| async {
        println!("[cleanup] should never run");
        Ok::<(), TaskError>(())
    });
    sched
        .schedule(
            TaskSpec::builder("cleanup")
                .with_work(cleanup)
                .with_delay(5, TimeUnit::Seconds)
                .on_cancelled(|| println!("[cleanup] on_cancelled"))
                .build(),
        )
        .await?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("flaky ran {} times", calls.load(Ordering::SeqCst));

    flags.disable(Feature::Cancellation);
    match sched.cancel("cleanup").await {
        Err(e @ ScheduleError::FeatureDisabled { .. }) => println!("cancel refused: {e}"),
        other => anyhow::bail!("unexpected cancel result: {other:?}"),
    }

    flags.enable(Feature::Cancellation);
    let cancelled = sched.cancel("cleanup").await?;
    println!("cleanup cancelled: {cancelled}");

    sched.shutdown().await;
    // Let the subscriber worker drain before exit.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
