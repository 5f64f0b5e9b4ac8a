//! # Subscriber fan-out for scheduler events
//!
//! The bus listener hands every scheduler [`Event`](crate::Event) to
//! [`SubscriberSet::emit`], which copies it into one bounded queue per
//! subscriber. Each queue is drained by its own worker, so a slow renderer
//! never holds up a timer task or the other subscribers.
//!
//! ```text
//! bus listener ── emit(&Event) ──┬─► queue "log" ────► worker ─► on_event()
//!                                ├─► queue "metrics" ► worker ─► on_event()
//!                                └─► ...
//! ```
//!
//! - `emit` never awaits; a full or closed queue drops the event for that
//!   subscriber only and logs the event's `seq`.
//! - Order is preserved per subscriber, not across subscribers.
//! - A panicking `on_event` is logged and the worker moves on to the next event.
//! - [`SubscriberSet::shutdown`] closes the queues and waits for the workers to
//!   flush what is already queued. The listener calls it once the bus closes.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

/// Sending side of one subscriber's queue.
struct Outlet {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Scheduler events fanned out to every registered subscriber.
pub struct SubscriberSet {
    outlets: Vec<Outlet>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Spawns a worker per subscriber with a queue of `queue_capacity()` events.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut outlets = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let (sender, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            outlets.push(Outlet {
                name: sub.name(),
                sender,
            });
            workers.push(tokio::spawn(drain_queue(sub, rx)));
        }

        Self { outlets, workers }
    }

    /// Queues `event` for every subscriber without waiting.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for outlet in &self.outlets {
            let why = match outlet.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker closed",
            };
            tracing::warn!(
                subscriber = outlet.name,
                seq = ev.seq,
                kind = ?ev.kind,
                "subscriber dropped event: {why}"
            );
        }
    }

    /// Closes every queue and waits until the workers have delivered the backlog.
    pub async fn shutdown(self) {
        drop(self.outlets);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outlets.len()
    }
}

/// Delivers queued events to `sub` until its queue closes.
async fn drain_queue(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>) {
    while let Some(ev) = rx.recv().await {
        let delivery = std::panic::AssertUnwindSafe(sub.on_event(ev.as_ref()));
        if let Err(payload) = delivery.catch_unwind().await {
            tracing::warn!(
                subscriber = sub.name(),
                seq = ev.seq,
                panic = %crate::core::panic_message(payload.as_ref()),
                "subscriber panicked"
            );
        }
    }
}
