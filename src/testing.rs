//! Testing utilities for schedules and drivers.
//!
//! Schedules are pure, so most of them can be tested with a dry run
//! ([`ScheduleExt::delays`](crate::ScheduleExt::delays)). The helpers here
//! cover the two impure seams: reading the time and sleeping.
//!
//! # Examples
//!
//! ## RecordingSleeper
//!
//! ```rust
//! use std::time::Duration;
//! use tidewater::prelude::*;
//! use tidewater::testing::RecordingSleeper;
//!
//! let sleeper = RecordingSleeper::new();
//! let schedule = spaced(PositiveDuration::from_millis(250)).union(recurs(2));
//!
//! let result = Runner::new()
//!     .with_sleeper(sleeper.clone())
//!     .retry(&schedule, || Err::<(), _>("down"));
//!
//! assert_eq!(result, Err(RunError::Failed("down")));
//! assert_eq!(sleeper.recorded(), vec![Duration::from_millis(250); 2]);
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tidewater::{assert_complete, assert_continues};
//!
//! let mut decisions = recurs(1).decisions();
//! assert_continues!(decisions.next().unwrap());
//! assert_complete!(decisions.next().unwrap());
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::driver::{AsyncSleeper, Cancelled, Sleeper};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct Script {
    pending: VecDeque<DateTime<Utc>>,
    last: DateTime<Utc>,
}

/// A clock that replays scripted timestamps.
///
/// Each call to [`Clock::now`] takes the next scripted time. Once the script
/// runs out, the last time is repeated.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use tidewater::clock::Clock;
/// use tidewater::testing::ManualClock;
///
/// let noon = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// let clock = ManualClock::at(noon);
/// assert_eq!(clock.now(), noon);
///
/// clock.advance(TimeDelta::seconds(5));
/// assert_eq!(clock.now(), noon + TimeDelta::seconds(5));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    script: Mutex<Script>,
}

impl ManualClock {
    /// A clock that is stopped at `time`.
    pub fn at(time: DateTime<Utc>) -> Self {
        Self::scripted([time])
    }

    /// A clock that returns `times` in order, then repeats the last one.
    ///
    /// An empty script starts at the Unix epoch.
    pub fn scripted(times: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let pending: VecDeque<_> = times.into_iter().collect();
        let last = pending.front().copied().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self {
            script: Mutex::new(Script { pending, last }),
        }
    }

    /// Drop the remaining script and stop the clock at `time`.
    pub fn set(&self, time: DateTime<Utc>) {
        let mut script = lock(&self.script);
        script.pending.clear();
        script.last = time;
    }

    /// Drop the remaining script and move the clock forward by `by`.
    pub fn advance(&self, by: TimeDelta) {
        let mut script = lock(&self.script);
        script.pending.clear();
        script.last = script
            .last
            .checked_add_signed(by)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut script = lock(&self.script);
        if let Some(next) = script.pending.pop_front() {
            script.last = next;
        }
        script.last
    }
}

/// A sleeper that records requested delays instead of waiting.
///
/// Clones share the same recording, so keep a clone to inspect after handing
/// one to a runner. Works with both the blocking and the async runner.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
    cancel_after: Option<usize>,
}

impl RecordingSleeper {
    /// A sleeper with an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the run's token instead of taking sleep number `sleeps + 1`.
    ///
    /// Simulates a caller that cancels while the driver is waiting.
    pub fn cancel_after(mut self, sleeps: usize) -> Self {
        self.cancel_after = Some(sleeps);
        self
    }

    /// Every delay slept so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.slept).clone()
    }

    /// Sum of every delay slept so far.
    pub fn total(&self) -> Duration {
        lock(&self.slept).iter().sum()
    }

    fn record(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let mut slept = lock(&self.slept);
        if self.cancel_after == Some(slept.len()) {
            cancel.cancel();
            return Err(Cancelled);
        }
        slept.push(delay);
        Ok(())
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.record(delay, cancel)
    }
}

impl AsyncSleeper for RecordingSleeper {
    fn sleep(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), Cancelled>> + Send {
        futures::future::ready(self.record(delay, cancel))
    }
}

/// Assert that a schedule decision continues, optionally after an exact delay.
///
/// This macro will panic if the decision is `Complete`.
///
/// # Example
///
/// ```rust
/// use tidewater::prelude::*;
/// use tidewater::assert_continues;
///
/// assert_continues!(ScheduleResult::RunAgain);
/// assert_continues!(
///     ScheduleResult::delay_for(PositiveDuration::from_millis(5)),
///     PositiveDuration::from_millis(5)
/// );
/// ```
#[macro_export]
macro_rules! assert_continues {
    ($decision:expr) => {
        match $decision {
            $crate::ScheduleResult::Complete => {
                panic!("Expected the schedule to continue, got Complete");
            }
            _ => {}
        }
    };
    ($decision:expr, $delay:expr) => {
        match $decision {
            $crate::ScheduleResult::Complete => {
                panic!(
                    "Expected the schedule to continue after {:?}, got Complete",
                    $delay
                );
            }
            decision => {
                assert_eq!(
                    decision.delay_or_zero(),
                    $crate::PositiveDuration::from($delay)
                );
            }
        }
    };
}

/// Assert that a schedule decision is `Complete`.
///
/// This macro will panic if the decision continues.
///
/// # Example
///
/// ```rust
/// use tidewater::prelude::*;
/// use tidewater::assert_complete;
///
/// assert_complete!(ScheduleResult::Complete);
/// ```
#[macro_export]
macro_rules! assert_complete {
    ($decision:expr) => {
        match $decision {
            $crate::ScheduleResult::Complete => {}
            decision => {
                panic!("Expected Complete, got {:?}", decision);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::PositiveDuration;
    use crate::schedule::ScheduleResult;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_manual_clock_replays_script_then_repeats() {
        let times = [noon(), noon() + TimeDelta::seconds(1)];
        let clock = ManualClock::scripted(times);
        assert_eq!(clock.now(), times[0]);
        assert_eq!(clock.now(), times[1]);
        assert_eq!(clock.now(), times[1]);
    }

    #[test]
    fn test_manual_clock_empty_script_starts_at_epoch() {
        let clock = ManualClock::scripted([]);
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_manual_clock_set_discards_script() {
        let clock = ManualClock::scripted([noon(), noon() + TimeDelta::hours(1)]);
        let later = noon() + TimeDelta::days(1);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_recording_sleeper_records_in_order() {
        let sleeper = RecordingSleeper::new();
        let token = CancellationToken::new();
        Sleeper::sleep(&sleeper, Duration::from_millis(3), &token).unwrap();
        Sleeper::sleep(&sleeper, Duration::from_millis(7), &token).unwrap();
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(3), Duration::from_millis(7)]
        );
        assert_eq!(sleeper.total(), Duration::from_millis(10));
    }

    #[test]
    fn test_recording_sleeper_clones_share_recording() {
        let sleeper = RecordingSleeper::new();
        let clone = sleeper.clone();
        Sleeper::sleep(&clone, Duration::from_secs(1), &CancellationToken::new()).unwrap();
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_recording_sleeper_honours_cancellation() {
        let sleeper = RecordingSleeper::new();
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            Sleeper::sleep(&sleeper, Duration::from_secs(1), &token),
            Err(Cancelled)
        );
        assert!(sleeper.recorded().is_empty());
    }

    #[test]
    fn test_recording_sleeper_cancel_after() {
        let sleeper = RecordingSleeper::new().cancel_after(1);
        let token = CancellationToken::new();
        assert!(Sleeper::sleep(&sleeper, Duration::from_secs(1), &token).is_ok());
        assert_eq!(
            Sleeper::sleep(&sleeper, Duration::from_secs(1), &token),
            Err(Cancelled)
        );
        assert!(token.is_cancelled());
        assert_eq!(sleeper.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_recording_sleeper_async() {
        let sleeper = RecordingSleeper::new();
        let token = CancellationToken::new();
        AsyncSleeper::sleep(&sleeper, Duration::from_millis(2), &token)
            .await
            .unwrap();
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(2)]);
    }

    #[test]
    fn test_assert_continues_macro() {
        assert_continues!(ScheduleResult::RunAgain);
        assert_continues!(ScheduleResult::RunAgain, PositiveDuration::ZERO);
        assert_continues!(
            ScheduleResult::delay_for(Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_assert_complete_macro() {
        assert_complete!(ScheduleResult::Complete);
    }

    #[test]
    #[should_panic(expected = "Expected the schedule to continue")]
    fn test_assert_continues_panics_on_complete() {
        assert_continues!(ScheduleResult::Complete);
    }

    #[test]
    #[should_panic(expected = "Expected Complete, got")]
    fn test_assert_complete_panics_on_continue() {
        assert_complete!(ScheduleResult::RunAgain);
    }
}
