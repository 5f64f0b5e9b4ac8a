//! # Scheduler: one-shot delayed execution with retries and cancellation.
//!
//! The [`Scheduler`] accepts [`TaskSpec`]s, arms one timer per task, and keeps
//! every live task in a registry until it completes, is cancelled, or is dropped
//! after a refused retry.
//!
//! ## Architecture
//! ```text
//! TaskSpec ──► Scheduler::schedule()
//!                  ├─► gate(Scheduler)
//!                  ├─► validate + normalize
//!                  └─► Registry::insert_with ──► Core::arm ──► tokio::spawn(run_attempt)
//!                                                    │
//!                                                    └─► Bus.publish(TaskScheduled)
//!
//! run_attempt: sleep(delay) ─► work ─► finalize | replace_with(retry) | TaskDead
//!
//! Scheduler::cancel(id)
//!     ├─► gate(Scheduler) + gate(Cancellation)
//!     ├─► Registry::cancel ─► token.cancel()
//!     ├─► Bus.publish(TaskCancelled)
//!     └─► on_cancelled()
//!
//! Bus ──► listener ──► SubscriberSet ──► Subscribe::on_event()
//! ```
//!
//! ## Rules
//! - Feature gates are read on every call; toggling takes effect immediately
//! - `schedule` returns once the task is registered and its timer armed
//! - `on_complete` runs at most once per task; never together with `on_cancelled`
//! - Callbacks run on the timer task; a panicking callback is logged and ignored
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskdefer::{Scheduler, SchedulerConfig, TaskFn, TaskError, TaskSpec, TimeUnit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sched = Scheduler::new(SchedulerConfig::default());
//!
//!     let spec = TaskSpec::builder("report")
//!         .with_work(TaskFn::arc(|_ctx: CancellationToken| async {
//!             Ok::<(), TaskError>(())
//!         }))
//!         .with_delay(200, TimeUnit::Milliseconds)
//!         .with_retries(2)
//!         .on_complete(|| println!("report done"))
//!         .build();
//!
//!     sched.schedule(spec).await?;
//!     tokio::time::sleep(Duration::from_millis(300)).await;
//!     assert!(sched.is_empty().await);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::SchedulerBuilder,
        config::SchedulerConfig,
        registry::{Handle, Registry},
        runner::{self, Attempt},
        state::{StateCell, TaskInfo, TaskState},
    },
    error::ScheduleError,
    events::{Bus, Event, EventKind},
    features::{Feature, FeatureGate},
    tasks::{TaskDescriptor, TaskSpec},
};

/// Shared runtime state behind every [`Scheduler`] clone and every armed attempt.
pub(crate) struct Core {
    pub cfg: SchedulerConfig,
    pub bus: Bus,
    pub registry: Registry,
    pub features: Arc<dyn FeatureGate>,
    pub runtime_token: CancellationToken,
}

impl Core {
    pub(crate) fn ensure_enabled(&self, feature: Feature) -> Result<(), ScheduleError> {
        if self.features.is_enabled(feature) {
            Ok(())
        } else {
            Err(ScheduleError::FeatureDisabled { feature })
        }
    }

    /// Arms one attempt: publishes `announce` and spawns its timer.
    ///
    /// Refused when the scheduler has been shut down or when called outside a
    /// Tokio runtime.
    pub(crate) fn arm(
        self: &Arc<Self>,
        task: Arc<TaskDescriptor>,
        retries: u32,
        attempt: u32,
        generation: u64,
        announce: Event,
    ) -> Result<Handle, ScheduleError> {
        if self.runtime_token.is_cancelled() {
            return Err(ScheduleError::rejected(&*task.id, "scheduler is shut down"));
        }
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| ScheduleError::rejected(&*task.id, e.to_string()))?;

        let token = self.runtime_token.child_token();
        let state = Arc::new(StateCell::new(TaskState::Pending));
        let armed = Attempt {
            task: Arc::clone(&task),
            generation,
            retries,
            attempt,
            state: Arc::clone(&state),
            token: token.clone(),
        };

        self.bus.publish(announce);
        let join = rt.spawn(runner::run_attempt(Arc::clone(self), armed));

        Ok(Handle {
            task,
            generation,
            retries,
            attempt,
            state,
            cancel: token,
            join,
        })
    }
}

/// Handle to a delayed one-shot task scheduler.
///
/// Cheap to clone; clones share the same registry, bus and feature gate.
#[derive(Clone)]
pub struct Scheduler {
    core: Arc<Core>,
}

impl Scheduler {
    /// Creates a scheduler without subscribers.
    ///
    /// Use [`Scheduler::builder`] to attach subscribers or inject a feature gate.
    pub fn new(cfg: SchedulerConfig) -> Self {
        SchedulerBuilder::new(cfg).build()
    }

    /// Returns a builder for a scheduler with subscribers and/or an external gate.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(crate) fn from_core(core: Arc<Core>) -> Self {
        Self { core }
    }

    /// Validates `spec`, registers it and arms its timer.
    ///
    /// ### Errors
    /// - `FeatureDisabled` if the scheduler flag is off (checked first)
    /// - `InvalidArgument` if id, work or unit is missing
    /// - `TaskExists` if a live task already uses the id
    /// - `SchedulingRejected` on capacity exhaustion, after `shutdown`, or
    ///   outside a Tokio runtime
    ///
    /// On any error nothing is registered.
    pub async fn schedule(&self, spec: TaskSpec) -> Result<(), ScheduleError> {
        self.core.ensure_enabled(Feature::Scheduler)?;
        let (task, retries) = spec.into_descriptor()?;
        let id = Arc::clone(&task.id);

        let core = &self.core;
        core.registry
            .insert_with(&id, core.cfg.pending_limit(), |generation| {
                let announce = Event::new(EventKind::TaskScheduled)
                    .with_task(Arc::clone(&id))
                    .with_attempt(1)
                    .with_retries(retries)
                    .with_delay(task.delay);
                core.arm(task, retries, 1, generation, announce)
            })
            .await
    }

    /// Schedules every spec in order, stopping at the first error.
    ///
    /// `None` is a no-op (after the scheduler gate). Specs before the failing one
    /// stay scheduled.
    pub async fn schedule_all<I>(&self, specs: Option<I>) -> Result<(), ScheduleError>
    where
        I: IntoIterator<Item = TaskSpec>,
    {
        self.core.ensure_enabled(Feature::Scheduler)?;
        let Some(specs) = specs else {
            return Ok(());
        };
        for spec in specs {
            self.schedule(spec).await?;
        }
        Ok(())
    }

    /// Cancels the live task `id`, interrupting its work if it is running.
    ///
    /// Returns `Ok(true)` whenever the task was live: finished and cancelled
    /// tasks leave the registry in the same step that ends them, so a registered
    /// task can always be cancelled. `on_cancelled` runs before this returns;
    /// `on_complete` never runs for a cancelled task.
    ///
    /// ### Errors
    /// - `FeatureDisabled` if the scheduler or the cancellation flag is off
    /// - `TaskNotFound` if `id` is unknown, already finished or already cancelled
    pub async fn cancel(&self, id: &str) -> Result<bool, ScheduleError> {
        self.core.ensure_enabled(Feature::Scheduler)?;
        self.core.ensure_enabled(Feature::Cancellation)?;

        let Some(outcome) = self.core.registry.cancel(id).await else {
            return Err(ScheduleError::TaskNotFound { id: id.to_string() });
        };

        self.core.bus.publish(
            Event::new(EventKind::TaskCancelled)
                .with_task(Arc::clone(&outcome.task.id))
                .with_attempt(outcome.attempt),
        );
        if let Some(cb) = &outcome.task.on_cancelled {
            runner::invoke_callback(cb, id, "on_cancelled");
        }
        Ok(true)
    }

    /// Snapshot of the live task `id`, if any.
    pub async fn get_task(&self, id: &str) -> Option<TaskInfo> {
        self.core.registry.get(id).await
    }

    /// Snapshot of every live task, keyed by id.
    pub async fn list_tasks(&self) -> HashMap<String, TaskInfo> {
        self.core.registry.snapshot().await
    }

    /// True if a live task is registered under `id`.
    pub async fn is_scheduled(&self, id: &str) -> bool {
        self.core.registry.contains(id).await
    }

    /// Number of live tasks.
    pub async fn len(&self) -> usize {
        self.core.registry.len().await
    }

    /// True if no task is live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stops the scheduler: refuses new work and cancels every live task.
    ///
    /// No callbacks run and no `TaskCancelled` events are published for tasks
    /// dropped here. Waits until every timer task has exited. Idempotent.
    pub async fn shutdown(&self) {
        self.core.runtime_token.cancel();
        let handles = self.core.registry.drain().await;
        let dropped = handles.len();
        for h in handles {
            h.state.transition(
                &[TaskState::Pending, TaskState::Running, TaskState::Retrying],
                TaskState::Cancelled,
            );
            h.cancel.cancel();
            if let Err(e) = h.join.await {
                tracing::warn!(task = %h.task.id, error = %e, "timer task ended abnormally");
            }
        }
        tracing::debug!(dropped, "scheduler shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::features::FeatureFlags;
    use crate::subscribers::Subscribe;
    use crate::tasks::{TaskFn, TaskRef, TimeUnit};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn noop() -> TaskRef {
        TaskFn::arc(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
    }

    fn recording(log: &Log, line: &'static str) -> TaskRef {
        let log = Arc::clone(log);
        TaskFn::arc(move |_ctx: CancellationToken| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(line.to_string());
                Ok::<(), TaskError>(())
            }
        })
    }

    /// Fails the first `failures` attempts, then succeeds.
    fn flaky(calls: &Arc<AtomicU32>, failures: u32) -> TaskRef {
        let calls = Arc::clone(calls);
        TaskFn::arc(move |_ctx: CancellationToken| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= failures {
                    Err(TaskError::fail(format!("attempt {n} failed")))
                } else {
                    Ok(())
                }
            }
        })
    }

    fn spec_ms(id: &str, work: TaskRef, delay: i64) -> TaskSpec {
        TaskSpec::builder(id)
            .with_work(work)
            .with_delay(delay, TimeUnit::Milliseconds)
            .build()
    }

    #[derive(Default)]
    struct Collector(Mutex<Vec<(EventKind, Option<String>)>>);

    #[async_trait]
    impl Subscribe for Collector {
        async fn on_event(&self, e: &Event) {
            let task = e.task.as_deref().map(str::to_string);
            self.0.lock().unwrap().push((e.kind, task));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_run_in_delay_order() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let out = log();

        sched.schedule(spec_ms("a", recording(&out, "a"), 3_000)).await.unwrap();
        sched.schedule(spec_ms("b", recording(&out, "b"), 2_000)).await.unwrap();
        sched.schedule(spec_ms("c", recording(&out, "c"), 1_000)).await.unwrap();
        assert_eq!(sched.len().await, 3);

        sleep(Duration::from_millis(3_500)).await;
        assert_eq!(entries(&out), vec!["c", "b", "a"]);
        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_firing_runs_on_cancelled_only() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let out = log();
        let (done, cancelled) = (Arc::clone(&out), Arc::clone(&out));

        let spec = TaskSpec::builder("job")
            .with_work(recording(&out, "ran"))
            .with_delay(1, TimeUnit::Seconds)
            .on_complete(move || done.lock().unwrap().push("complete".into()))
            .on_cancelled(move || cancelled.lock().unwrap().push("cancelled".into()))
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_millis(100)).await;
        assert!(sched.cancel("job").await.unwrap());
        assert!(!sched.is_scheduled("job").await);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(entries(&out), vec!["cancelled"]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_retry_makes_two_attempts() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let completions = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&completions);

        let spec = TaskSpec::builder("flaky")
            .with_work(flaky(&calls, 1))
            .with_delay(100, TimeUnit::Milliseconds)
            .with_retries(1)
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_millis(150)).await;
        let info = sched.get_task("flaky").await.unwrap();
        assert_eq!(info.attempt, 2);
        assert_eq!(info.retries, 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_bounds_attempts() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let completions = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&completions);

        let spec = TaskSpec::builder("always-failing")
            .with_work(flaky(&calls, u32::MAX))
            .with_delay(10, TimeUnit::Milliseconds)
            .with_retries(3)
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retry_completes_once_and_never_cancels() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let completions = Arc::new(AtomicU32::new(0));
        let cancellations = Arc::new(AtomicU32::new(0));
        let (c, x) = (Arc::clone(&completions), Arc::clone(&cancellations));

        let spec = TaskSpec::builder("doomed")
            .with_work(flaky(&calls, u32::MAX))
            .with_delay(50, TimeUnit::Milliseconds)
            .with_retries(1)
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_cancelled(move || {
                x.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(cancellations.load(Ordering::SeqCst), 0);
        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_between_attempts_stops_the_retry() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let completions = Arc::new(AtomicU32::new(0));
        let cancellations = Arc::new(AtomicU32::new(0));
        let (c, x) = (Arc::clone(&completions), Arc::clone(&cancellations));

        let spec = TaskSpec::builder("retrying")
            .with_work(flaky(&calls, u32::MAX))
            .with_delay(100, TimeUnit::Milliseconds)
            .with_retries(3)
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_cancelled(move || {
                x.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        sched.schedule(spec).await.unwrap();

        // first attempt fails at 100ms; the second waits until 200ms
        sleep(Duration::from_millis(150)).await;
        let info = sched.get_task("retrying").await.unwrap();
        assert_eq!(info.attempt, 2);
        assert_eq!(info.state, TaskState::Pending);
        assert!(sched.cancel("retrying").await.unwrap());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cancellations.load(Ordering::SeqCst), 1);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn negative_delay_and_retries_are_normalized() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let calls = Arc::new(AtomicU32::new(0));

        let spec = TaskSpec::builder("now")
            .with_work(flaky(&calls, u32::MAX))
            .with_delay(-5, TimeUnit::Seconds)
            .with_retries(-2)
            .build();
        sched.schedule(spec).await.unwrap();

        let info = sched.get_task("now").await.unwrap();
        assert_eq!(info.delay, Duration::ZERO);
        assert_eq!(info.retries, 0);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sched.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_specs_register_nothing() {
        let sched = Scheduler::new(SchedulerConfig::default());

        let mut no_work = TaskSpec::builder("a")
            .with_delay(1, TimeUnit::Seconds)
            .build();
        no_work.set_work(None);
        let err = sched.schedule(no_work).await.unwrap_err();
        assert_eq!(err.as_label(), "invalid_argument");

        let mut no_unit = spec_ms("b", noop(), 10);
        no_unit.set_unit(None);
        assert!(matches!(
            sched.schedule(no_unit).await,
            Err(ScheduleError::InvalidArgument { .. })
        ));

        let empty_id = spec_ms("", noop(), 10);
        assert!(matches!(
            sched.schedule(empty_id).await,
            Err(ScheduleError::InvalidArgument { .. })
        ));

        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_unknown_or_finished_task_is_not_found() {
        let sched = Scheduler::new(SchedulerConfig::default());
        assert!(matches!(
            sched.cancel("ghost").await,
            Err(ScheduleError::TaskNotFound { .. })
        ));

        sched.schedule(spec_ms("quick", noop(), 10)).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            sched.cancel("quick").await,
            Err(ScheduleError::TaskNotFound { .. })
        ));

        sched.schedule(spec_ms("twice", noop(), 1_000)).await.unwrap();
        assert!(sched.cancel("twice").await.unwrap());
        assert!(matches!(
            sched.cancel("twice").await,
            Err(ScheduleError::TaskNotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn feature_flags_gate_every_call() {
        let flags = Arc::new(FeatureFlags::default());
        let sched = Scheduler::builder(SchedulerConfig::default())
            .with_features(flags.clone())
            .build();

        flags.disable(Feature::Scheduler);
        let err = sched.schedule(spec_ms("a", noop(), 10)).await.unwrap_err();
        assert_eq!(
            err,
            ScheduleError::FeatureDisabled {
                feature: Feature::Scheduler
            }
        );
        let none: Option<Vec<TaskSpec>> = None;
        assert!(sched.schedule_all(none).await.is_err());
        assert!(sched.cancel("a").await.is_err());
        assert!(sched.is_empty().await);

        flags.enable(Feature::Scheduler);
        flags.disable(Feature::Cancellation);
        sched.schedule(spec_ms("a", noop(), 1_000)).await.unwrap();
        assert_eq!(
            sched.cancel("a").await.unwrap_err(),
            ScheduleError::FeatureDisabled {
                feature: Feature::Cancellation
            }
        );
        assert!(sched.is_scheduled("a").await);

        flags.enable(Feature::Cancellation);
        assert!(sched.cancel("a").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_scheduler_drops_pending_retry() {
        let flags = Arc::new(FeatureFlags::default());
        let collector = Arc::new(Collector::default());
        let sched = Scheduler::builder(SchedulerConfig::default())
            .with_features(flags.clone())
            .with_subscribers(vec![collector.clone() as Arc<dyn Subscribe>])
            .build();
        let calls = Arc::new(AtomicU32::new(0));
        let completions = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&completions);

        let spec = TaskSpec::builder("retrying")
            .with_work(flaky(&calls, u32::MAX))
            .with_delay(100, TimeUnit::Milliseconds)
            .with_retries(2)
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        sched.schedule(spec).await.unwrap();

        flags.disable(Feature::Scheduler);
        sleep(Duration::from_millis(500)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert!(sched.is_empty().await);
        let kinds: Vec<EventKind> = collector.0.lock().unwrap().iter().map(|(k, _)| *k).collect();
        assert!(kinds.contains(&EventKind::TaskDead));
    }

    #[tokio::test(start_paused = true)]
    async fn list_tasks_exposes_the_scheduled_work() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let work = noop();

        sched.schedule(spec_ms("a", Arc::clone(&work), 1_000)).await.unwrap();
        sched.schedule(spec_ms("b", noop(), 2_000)).await.unwrap();

        let tasks = sched.list_tasks().await;
        assert_eq!(tasks.len(), 2);
        let a = &tasks["a"];
        assert!(Arc::ptr_eq(&a.work, &work));
        assert_eq!(a.delay, Duration::from_secs(1));
        assert_eq!(a.state, TaskState::Pending);
        assert_eq!(a.attempt, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_id_is_rejected_while_live() {
        let sched = Scheduler::new(SchedulerConfig::default());
        sched.schedule(spec_ms("dup", noop(), 100)).await.unwrap();
        assert!(matches!(
            sched.schedule(spec_ms("dup", noop(), 100)).await,
            Err(ScheduleError::TaskExists { .. })
        ));

        sleep(Duration::from_millis(200)).await;
        sched.schedule(spec_ms("dup", noop(), 100)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_limit_rejects_new_tasks() {
        let cfg = SchedulerConfig {
            max_pending: 1,
            ..SchedulerConfig::default()
        };
        let sched = Scheduler::new(cfg);
        sched.schedule(spec_ms("a", noop(), 100)).await.unwrap();
        let err = sched.schedule(spec_ms("b", noop(), 100)).await.unwrap_err();
        assert_eq!(err.as_label(), "scheduling_rejected");
        assert!(!sched.is_scheduled("b").await);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_silently_and_rejects_new_work() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let out = log();
        let (done, cancelled) = (Arc::clone(&out), Arc::clone(&out));

        let spec = TaskSpec::builder("job")
            .with_work(recording(&out, "ran"))
            .with_delay(1, TimeUnit::Seconds)
            .on_complete(move || done.lock().unwrap().push("complete".into()))
            .on_cancelled(move || cancelled.lock().unwrap().push("cancelled".into()))
            .build();
        sched.schedule(spec).await.unwrap();

        sched.shutdown().await;
        assert!(sched.is_empty().await);
        assert!(matches!(
            sched.schedule(spec_ms("late", noop(), 10)).await,
            Err(ScheduleError::SchedulingRejected { .. })
        ));

        sleep(Duration::from_secs(2)).await;
        assert!(entries(&out).is_empty());
        sched.shutdown().await;
    }

    #[derive(Default)]
    struct DeadCounter(AtomicU32);

    #[async_trait]
    impl Subscribe for DeadCounter {
        async fn on_event(&self, e: &Event) {
            if e.kind == EventKind::TaskDead {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shutdown_during_retries_drops_no_task_as_dead() {
        let dead = Arc::new(DeadCounter::default());
        let sched = Scheduler::builder(SchedulerConfig::default())
            .with_subscribers(vec![dead.clone() as Arc<dyn Subscribe>])
            .build();
        let calls = Arc::new(AtomicU32::new(0));

        for i in 0..200 {
            let spec = TaskSpec::builder(format!("failing-{i}"))
                .with_work(flaky(&calls, u32::MAX))
                .with_delay(0, TimeUnit::Milliseconds)
                .with_retries(i32::MAX)
                .build();
            sched.schedule(spec).await.unwrap();
        }

        sleep(Duration::from_millis(20)).await;
        assert!(calls.load(Ordering::SeqCst) > 200);
        sched.shutdown().await;
        sleep(Duration::from_millis(100)).await;

        assert_eq!(dead.0.load(Ordering::SeqCst), 0);
        assert!(sched.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_skips_remaining_retries() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let completions = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&completions);

        let work: TaskRef = TaskFn::arc(move |_ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TaskError::fatal("bad config")) }
        });
        let spec = TaskSpec::builder("fatal")
            .with_work(work)
            .with_delay(10, TimeUnit::Milliseconds)
            .with_retries(5)
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_work_counts_as_failure() {
        let collector = Arc::new(Collector::default());
        let sched = Scheduler::builder(SchedulerConfig::default())
            .with_subscribers(vec![collector.clone() as Arc<dyn Subscribe>])
            .build();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let work: TaskRef = TaskFn::arc(move |_ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    panic!("boom");
                }
                Ok::<(), TaskError>(())
            }
        });
        let spec = TaskSpec::builder("panicky")
            .with_work(work)
            .with_delay(10, TimeUnit::Milliseconds)
            .with_retries(1)
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(sched.is_empty().await);

        let kinds: Vec<EventKind> = collector.0.lock().unwrap().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskScheduled,
                EventKind::TaskFired,
                EventKind::TaskFailed,
                EventKind::RetryScheduled,
                EventKind::TaskFired,
                EventKind::TaskCompleted,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_running_work() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let out = log();
        let finished = Arc::clone(&out);
        let cancelled = Arc::clone(&out);

        let work: TaskRef = TaskFn::arc(move |_ctx: CancellationToken| {
            let finished = Arc::clone(&finished);
            async move {
                sleep(Duration::from_secs(10)).await;
                finished.lock().unwrap().push("finished".into());
                Ok::<(), TaskError>(())
            }
        });
        let spec = TaskSpec::builder("long")
            .with_work(work)
            .with_delay(10, TimeUnit::Milliseconds)
            .on_cancelled(move || cancelled.lock().unwrap().push("cancelled".into()))
            .build();
        sched.schedule(spec).await.unwrap();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(sched.get_task("long").await.unwrap().state, TaskState::Running);
        assert!(sched.cancel("long").await.unwrap());

        sleep(Duration::from_secs(20)).await;
        assert_eq!(entries(&out), vec!["cancelled"]);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_all_stops_at_first_error() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let none: Option<Vec<TaskSpec>> = None;
        sched.schedule_all(none).await.unwrap();
        assert!(sched.is_empty().await);

        let batch = vec![
            spec_ms("one", noop(), 100),
            spec_ms("", noop(), 100),
            spec_ms("three", noop(), 100),
        ];
        assert!(sched.schedule_all(Some(batch)).await.is_err());
        assert!(sched.is_scheduled("one").await);
        assert!(!sched.is_scheduled("three").await);
    }

    #[test]
    fn scheduling_outside_a_runtime_is_rejected() {
        let sched = Scheduler::new(SchedulerConfig::default());
        let err = futures::executor::block_on(sched.schedule(spec_ms("a", noop(), 10)))
            .unwrap_err();
        assert_eq!(err.as_label(), "scheduling_rejected");
        assert!(futures::executor::block_on(sched.is_empty()));
    }
}
