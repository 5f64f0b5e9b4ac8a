//! Time units for task delays.

use std::time::Duration;

/// Unit in which a task delay is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Converts `amount` of this unit into a [`Duration`], saturating on overflow.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use taskdefer::TimeUnit;
    ///
    /// assert_eq!(TimeUnit::Milliseconds.to_duration(250), Duration::from_millis(250));
    /// assert_eq!(TimeUnit::Minutes.to_duration(2), Duration::from_secs(120));
    /// ```
    pub fn to_duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(amount),
            TimeUnit::Microseconds => Duration::from_micros(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            TimeUnit::Days => Duration::from_secs(amount.saturating_mul(86_400)),
        }
    }
}
