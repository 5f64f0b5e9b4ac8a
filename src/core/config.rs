//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`] centralized settings for the scheduler runtime.
//!
//! Config is used once, at construction: `Scheduler::builder(cfg).build()`.
//!
//! ## Sentinel values
//! - `max_pending = 0` → unlimited (no capacity check on `schedule`)

/// Global configuration for the scheduler.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `max_pending`: Maximum number of live tasks (`0` = unlimited)
/// - `scheduler_enabled`: Initial value of the scheduler flag
/// - `cancellation_enabled`: Initial value of the cancellation flag
///
/// The two flags only seed the built-in [`FeatureFlags`](crate::FeatureFlags);
/// they are ignored when an external gate is injected with
/// [`SchedulerBuilder::with_features`](crate::SchedulerBuilder::with_features).
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// A lagging bus listener skips the oldest events and logs a warning.
    pub bus_capacity: usize,

    /// Maximum number of tasks registered at the same time.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = `schedule` fails with `SchedulingRejected` once `n` tasks are live
    ///
    /// Retries re-use their task's slot and are never refused by this limit.
    pub max_pending: usize,

    /// Whether scheduling starts enabled.
    pub scheduler_enabled: bool,

    /// Whether cancellation starts enabled.
    pub cancellation_enabled: bool,
}

impl SchedulerConfig {
    /// Returns the pending-task limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` live tasks
    #[inline]
    pub fn pending_limit(&self) -> Option<usize> {
        if self.max_pending == 0 {
            None
        } else {
            Some(self.max_pending)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `max_pending = 0` (unlimited)
    /// - `scheduler_enabled = true`
    /// - `cancellation_enabled = true`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            max_pending: 0,
            scheduler_enabled: true,
            cancellation_enabled: true,
        }
    }
}
