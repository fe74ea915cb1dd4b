//! # Tidewater
//!
//! > *"Time and tide wait for no one, but your retries should."*
//!
//! Composable retry and repeat schedules for Rust.
//!
//! ## Philosophy
//!
//! **Tidewater** splits scheduling into a **pure core** and an **imperative
//! shell**:
//! - **Schedules** are pure step functions. Given a context, they decide
//!   whether to run again and how long to wait. They never sleep.
//! - **Drivers** run your effect, ask the schedule what to do, and sleep.
//!   They are the only place where time passes.
//!
//! Because schedules are pure, you can inspect one without running anything
//! (a dry run) and test it without waiting.
//!
//! ## Quick Example
//!
//! ```rust
//! use tidewater::prelude::*;
//!
//! // Exponential backoff from 10ms, capped at 1s, at most 4 retries
//! let schedule = exponential(PositiveDuration::from_millis(10), 2.0)
//!     .max_delay(PositiveDuration::from_secs(1))
//!     .union(recurs(4));
//!
//! // Dry run: inspect the delays without running anything
//! let delays: Vec<u64> = schedule.clone().delays().map(|d| d.as_millis()).collect();
//! assert_eq!(delays, vec![10, 20, 40, 80]);
//!
//! // Real run
//! let mut attempts = 0;
//! let result = retry(&schedule, || {
//!     attempts += 1;
//!     if attempts < 3 { Err("busy") } else { Ok(attempts) }
//! });
//! assert_eq!(result, Ok(3));
//! ```
//!
//! ## Modules
//!
//! - [`schedule`]: the [`Schedule`] trait, built-in schedules and combinators
//! - [`driver`]: blocking and async runners, cancellation, observers
//! - [`config`]: declarative, serde-friendly schedule configuration
//! - [`testing`]: a scripted clock, a recording sleeper and assertion macros

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod clock;
pub mod config;
pub mod driver;
pub mod duration;
pub mod random;
pub mod schedule;
pub mod testing;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use config::{Backoff, ConfigError, JitterConfig, RetryConfig};
pub use driver::{AsyncRunner, Cancelled, RunError, Runner, ScheduleEvent};
pub use duration::PositiveDuration;
pub use random::RandomSource;
pub use schedule::{
    BoxedSchedule, ResultSchedule, Schedule, ScheduleContext, ScheduleExt, ScheduleResult,
    ScheduleStatus,
};

/// Prelude module for convenient imports.
///
/// The prelude brings in [`ScheduleExt`] but not the [`Schedule`] and
/// [`ResultSchedule`] traits themselves: both declare `start` and `step`, so
/// importing them together would make those calls ambiguous. Import
/// [`Schedule`] explicitly when stepping a schedule by hand.
pub mod prelude {
    pub use crate::driver::{
        fold, fold_until, fold_while, repeat, repeat_until, repeat_while, retry, retry_until,
        retry_while, AsyncRunner, RunError, Runner, ScheduleEvent,
    };
    pub use crate::duration::PositiveDuration;
    pub use crate::random::RandomSource;
    pub use crate::schedule::{
        aws_decorrelated, day_of_week, exponential, fibonacci, fixed, forever, from_durations,
        hour_of_day, linear, minute_of_hour, once, polly_decorrelated, recurs, second_of_minute,
        spaced, windowed, BoxedSchedule, ScheduleContext, ScheduleExt, ScheduleResult,
        ScheduleStatus,
    };
}
