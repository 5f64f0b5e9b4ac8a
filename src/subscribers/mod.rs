//! # Event subscribers for the scheduler.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used to deliver scheduler events (the injectable observability sink).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Scheduler / retry wrapper ── publish(Event) ──► Bus ──► bus listener
//!                                                              │
//!                                                              ▼
//!                                                        SubscriberSet::emit(&Event)
//!                                                     ┌────────┼─────────┐
//!                                                     ▼        ▼         ▼
//!                                                 LogWriter  Metrics  Collector ...
//! ```
//!
//! Tests attach a collecting subscriber instead of depending on process-wide
//! logging state.

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
