//! Timing constants for the calculator's periodic tasks.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default cadences.
pub mod constants {
    use super::Duration;

    /// Live rate tick interval (3 seconds).
    pub fn rate_tick_interval() -> Duration {
        Duration::from_millis(3000)
    }

    /// Display poll interval (1 second).
    pub fn poll_interval() -> Duration {
        Duration::from_millis(1000)
    }

    /// How long an override advisory stays visible (2.5 seconds).
    pub fn advisory_ttl() -> Duration {
        Duration::from_millis(2500)
    }
}

/// A timestamp (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}
