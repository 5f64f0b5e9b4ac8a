use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    core::SchedulerConfig,
    events::{Bus, Event},
    features::{FeatureFlags, FeatureGate},
    subscribers::{Subscribe, SubscriberSet},
};
use super::{
    registry::Registry,
    scheduler::{Core, Scheduler},
};

/// Builder for constructing a [`Scheduler`] with optional subscribers and gate.
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    features: Option<Arc<dyn FeatureGate>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            features: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive scheduler events (scheduled, fired, failed, retry,
    /// cancelled, completed, dead) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Injects the feature gate consulted on every call.
    ///
    /// Keep a clone of the `Arc` to toggle flags at runtime. Without this, the
    /// scheduler owns a private [`FeatureFlags`] seeded from the config.
    pub fn with_features(mut self, gate: Arc<dyn FeatureGate>) -> Self {
        self.features = Some(gate);
        self
    }

    /// Builds the scheduler.
    ///
    /// A builder without subscribers spawns nothing and can run anywhere;
    /// scheduling outside a runtime is then reported as `SchedulingRejected`.
    ///
    /// # Panics
    /// Panics when subscribers are attached and this is called outside a Tokio
    /// runtime, since the bus listener and subscriber workers are spawned here.
    pub fn build(self) -> Scheduler {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers);
            spawn_listener(bus.subscribe(), set);
        }

        let features = self.features.unwrap_or_else(|| {
            Arc::new(FeatureFlags::new(
                self.cfg.scheduler_enabled,
                self.cfg.cancellation_enabled,
            ))
        });

        Scheduler::from_core(Arc::new(Core {
            cfg: self.cfg,
            bus,
            registry: Registry::new(),
            features,
            runtime_token: CancellationToken::new(),
        }))
    }
}

/// Forwards bus events to the subscriber set until the bus closes.
fn spawn_listener(mut rx: broadcast::Receiver<Event>, set: SubscriberSet) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
