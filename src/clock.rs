//! Wall-clock abstraction for time-anchored schedules.

use std::fmt;

use chrono::{DateTime, Utc};

/// A source of the current time.
///
/// Time-anchored schedules (`fixed`, `windowed`, and the calendar
/// schedules) read the clock once per decision. Production code uses
/// [`SystemClock`]; tests inject
/// [`ManualClock`](crate::testing::ManualClock) to replay exact timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
