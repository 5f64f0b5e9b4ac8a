use std::sync::Arc;
use std::time::Duration;

use crate::tasks::spec::{Callback, TaskSpec};
use crate::tasks::task::TaskRef;
use crate::tasks::unit::TimeUnit;

/// Builder for TaskSpec with fluent API
#[derive(Clone)]
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl TaskSpecBuilder {
    /// Creates a new builder for the given task id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            spec: TaskSpec {
                id: id.into(),
                ..TaskSpec::default()
            },
        }
    }

    pub fn with_work(mut self, work: TaskRef) -> Self {
        self.spec.work = Some(work);
        self
    }

    pub fn with_delay(mut self, amount: i64, unit: TimeUnit) -> Self {
        self.spec.delay = amount;
        self.spec.unit = Some(unit);
        self
    }

    /// Delay given as a `Duration` (stored in milliseconds, saturating).
    pub fn after(self, delay: Duration) -> Self {
        let ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        self.with_delay(ms, TimeUnit::Milliseconds)
    }

    pub fn with_retries(mut self, retries: i32) -> Self {
        self.spec.retries = retries;
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.spec.on_complete = Some(Arc::new(f) as Callback);
        self
    }

    pub fn on_cancelled(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.spec.on_cancelled = Some(Arc::new(f) as Callback);
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}

impl TaskSpec {
    /// Creates a builder for constructing TaskSpec with fluent API
    pub fn builder(id: impl Into<String>) -> TaskSpecBuilder {
        TaskSpecBuilder::new(id)
    }
}
