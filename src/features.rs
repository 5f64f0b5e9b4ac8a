//! # Feature gates consulted by the scheduler.
//!
//! The scheduler re-reads its gates on **every** call (no caching), so flags can
//! be flipped at any time while tasks are in flight.
//!
//! - [`Feature::Scheduler`] gates `schedule`, `schedule_all` and `cancel`.
//! - [`Feature::Cancellation`] additionally gates `cancel`.
//!
//! Any configuration source can back the gates by implementing [`FeatureGate`];
//! closures `Fn(Feature) -> bool` implement it out of the box. [`FeatureFlags`]
//! is the built-in in-memory implementation.
//!
//! ## Example
//! ```rust
//! use taskdefer::{Feature, FeatureFlags, FeatureGate};
//!
//! let flags = FeatureFlags::default();
//! assert!(flags.is_enabled(Feature::Cancellation));
//!
//! flags.set(Feature::Cancellation, false);
//! assert!(!flags.is_enabled(Feature::Cancellation));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Toggleable scheduler capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Scheduling as a whole (also required for cancellation).
    Scheduler,
    /// Cancellation of scheduled tasks.
    Cancellation,
}

impl Feature {
    /// Stable configuration key of the flag.
    pub fn key(&self) -> &'static str {
        match self {
            Feature::Scheduler => "taskdefer.enabled",
            Feature::Cancellation => "taskdefer.cancellation.enabled",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Boolean query interface over feature flags.
pub trait FeatureGate: Send + Sync + 'static {
    /// Returns whether `feature` is currently enabled.
    fn is_enabled(&self, feature: Feature) -> bool;
}

impl<F> FeatureGate for F
where
    F: Fn(Feature) -> bool + Send + Sync + 'static,
{
    fn is_enabled(&self, feature: Feature) -> bool {
        self(feature)
    }
}

/// In-memory feature flags, safe to toggle from any thread.
#[derive(Debug)]
pub struct FeatureFlags {
    scheduler: AtomicBool,
    cancellation: AtomicBool,
}

impl FeatureFlags {
    /// Creates flags with the given initial values.
    pub fn new(scheduler: bool, cancellation: bool) -> Self {
        Self {
            scheduler: AtomicBool::new(scheduler),
            cancellation: AtomicBool::new(cancellation),
        }
    }

    /// Sets `feature` to `enabled`.
    pub fn set(&self, feature: Feature, enabled: bool) {
        self.flag(feature).store(enabled, Ordering::SeqCst);
    }

    /// Enables `feature`.
    pub fn enable(&self, feature: Feature) {
        self.set(feature, true);
    }

    /// Disables `feature`.
    pub fn disable(&self, feature: Feature) {
        self.set(feature, false);
    }

    fn flag(&self, feature: Feature) -> &AtomicBool {
        match feature {
            Feature::Scheduler => &self.scheduler,
            Feature::Cancellation => &self.cancellation,
        }
    }
}

impl Default for FeatureFlags {
    /// All features enabled.
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl FeatureGate for FeatureFlags {
    fn is_enabled(&self, feature: Feature) -> bool {
        self.flag(feature).load(Ordering::SeqCst)
    }
}
