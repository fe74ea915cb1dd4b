//! Time-anchored schedules that read a [`Clock`].
//!
//! `fixed` and `windowed` align runs to interval boundaries measured from
//! the first decision. The calendar schedules wait for the next wall-clock
//! occurrence of a second, minute, hour or weekday.
//!
//! All of them read the clock once per decision. Inject a deterministic clock
//! with `with_clock`:
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use tidewater::prelude::*;
//! use tidewater::testing::ManualClock;
//!
//! let clock = ManualClock::scripted([
//!     Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 20).unwrap(),
//! ]);
//! let schedule = second_of_minute(30).unwrap().with_clock(Arc::new(clock));
//!
//! let first = schedule.delays().next().unwrap();
//! assert_eq!(first, PositiveDuration::from_secs(10));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Timelike, Utc, Weekday};

use crate::clock::{Clock, SystemClock};
use crate::duration::PositiveDuration;
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// A calendar unit value outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarError {
    /// The unit that was out of range.
    pub unit: &'static str,
    /// The rejected value.
    pub value: u32,
    /// The exclusive upper bound for the unit.
    pub limit: u32,
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be less than {}, got {}",
            self.unit, self.limit, self.value
        )
    }
}

impl std::error::Error for CalendarError {}

fn check(unit: &'static str, value: u32, limit: u32) -> Result<u32, CalendarError> {
    if value < limit {
        Ok(value)
    } else {
        Err(CalendarError { unit, value, limit })
    }
}

fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

fn add(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(delta)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

/// Time left until the next multiple of `interval` since `start`. A run that
/// lands exactly on a boundary waits a full interval.
fn until_boundary(start: DateTime<Utc>, now: DateTime<Utc>, interval: Duration) -> Duration {
    let interval_nanos = interval.as_nanos();
    let into_window = elapsed(start, now).as_nanos() % interval_nanos;
    let remaining = interval_nanos - into_window;
    Duration::from_nanos(u64::try_from(remaining).unwrap_or(u64::MAX))
}

/// Anchor of a [`Fixed`] schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnchor {
    start: DateTime<Utc>,
    next_run: DateTime<Utc>,
}

/// Runs on interval boundaries, skipping boundaries that were missed.
///
/// If a run overruns past the next boundary, the following run starts
/// immediately and the schedule realigns afterwards, instead of firing once
/// per missed boundary.
#[derive(Debug, Clone)]
pub struct Fixed {
    interval: PositiveDuration,
    clock: Arc<dyn Clock>,
}

/// Run on every `interval` boundary, measured from the first decision.
pub fn fixed(interval: impl Into<PositiveDuration>) -> Fixed {
    Fixed {
        interval: interval.into(),
        clock: system_clock(),
    }
}

impl Fixed {
    /// Read time from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Schedule for Fixed {
    type State = Option<FixedAnchor>;

    fn start(&self) -> Self::State {
        None
    }

    fn step(
        &self,
        state: Self::State,
        _context: &ScheduleContext,
    ) -> (ScheduleResult, Self::State) {
        let interval = self.interval.as_duration();
        if interval.is_zero() {
            return (ScheduleResult::RunAgain, state);
        }
        let now = self.clock.now();
        match state {
            None => (
                ScheduleResult::DelayAndRunAgain(self.interval),
                Some(FixedAnchor {
                    start: now,
                    next_run: add(now, interval),
                }),
            ),
            Some(FixedAnchor { start, next_run }) => {
                let running_behind = now > add(next_run, interval);
                if running_behind {
                    (
                        ScheduleResult::RunAgain,
                        Some(FixedAnchor {
                            start,
                            next_run: now,
                        }),
                    )
                } else {
                    let sleep = until_boundary(start, now, interval);
                    (
                        ScheduleResult::delay_for(sleep),
                        Some(FixedAnchor {
                            start,
                            next_run: add(now, sleep),
                        }),
                    )
                }
            }
        }
    }
}

/// Always sleeps until the next interval boundary.
///
/// Unlike [`Fixed`], an overrunning run never triggers an immediate rerun;
/// the schedule simply waits for the following boundary.
#[derive(Debug, Clone)]
pub struct Windowed {
    interval: PositiveDuration,
    clock: Arc<dyn Clock>,
}

/// Run at the next `interval` boundary, measured from the first decision.
pub fn windowed(interval: impl Into<PositiveDuration>) -> Windowed {
    Windowed {
        interval: interval.into(),
        clock: system_clock(),
    }
}

impl Windowed {
    /// Read time from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Schedule for Windowed {
    type State = Option<DateTime<Utc>>;

    fn start(&self) -> Self::State {
        None
    }

    fn step(
        &self,
        state: Self::State,
        _context: &ScheduleContext,
    ) -> (ScheduleResult, Self::State) {
        let interval = self.interval.as_duration();
        if interval.is_zero() {
            return (ScheduleResult::RunAgain, state);
        }
        let now = self.clock.now();
        match state {
            None => (ScheduleResult::DelayAndRunAgain(self.interval), Some(now)),
            Some(start) => (
                ScheduleResult::delay_for(until_boundary(start, now, interval)),
                Some(start),
            ),
        }
    }
}

/// Step a calendar schedule: wait until `next`, or complete if the target
/// cannot be represented.
fn calendar_step(
    clock: &dyn Clock,
    next: impl FnOnce(DateTime<Utc>) -> Option<DateTime<Utc>>,
) -> ScheduleResult {
    let now = clock.now();
    match next(now) {
        Some(at) => ScheduleResult::delay_for(elapsed(now, at)),
        None => ScheduleResult::Complete,
    }
}

/// The first of `candidate`, `candidate + period`, ... strictly after `now`.
fn strictly_after(
    now: DateTime<Utc>,
    candidate: DateTime<Utc>,
    period: TimeDelta,
) -> Option<DateTime<Utc>> {
    if candidate > now {
        Some(candidate)
    } else {
        candidate.checked_add_signed(period)
    }
}

macro_rules! calendar_schedule {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            target: u32,
            clock: Arc<dyn Clock>,
        }

        impl $name {
            /// Read time from `clock` instead of the system clock.
            pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
                self.clock = clock;
                self
            }
        }
    };
}

calendar_schedule!(
    /// Runs when the wall clock reaches a given second of each minute.
    SecondOfMinute
);
calendar_schedule!(
    /// Runs at the start of a given minute of each hour.
    MinuteOfHour
);
calendar_schedule!(
    /// Runs at the start of a given hour of each day.
    HourOfDay
);

/// Run every minute when the clock reaches `second` (0-59).
pub fn second_of_minute(second: u32) -> Result<SecondOfMinute, CalendarError> {
    Ok(SecondOfMinute {
        target: check("second", second, 60)?,
        clock: system_clock(),
    })
}

/// Run every hour at the start of `minute` (0-59).
pub fn minute_of_hour(minute: u32) -> Result<MinuteOfHour, CalendarError> {
    Ok(MinuteOfHour {
        target: check("minute", minute, 60)?,
        clock: system_clock(),
    })
}

/// Run every day at the start of `hour` (0-23).
pub fn hour_of_day(hour: u32) -> Result<HourOfDay, CalendarError> {
    Ok(HourOfDay {
        target: check("hour", hour, 24)?,
        clock: system_clock(),
    })
}

impl Schedule for SecondOfMinute {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        let decision = calendar_step(self.clock.as_ref(), |now| {
            let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), self.target)?;
            strictly_after(now, now.date_naive().and_time(time).and_utc(), TimeDelta::minutes(1))
        });
        (decision, ())
    }
}

impl Schedule for MinuteOfHour {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        let decision = calendar_step(self.clock.as_ref(), |now| {
            let time = NaiveTime::from_hms_opt(now.hour(), self.target, 0)?;
            strictly_after(now, now.date_naive().and_time(time).and_utc(), TimeDelta::hours(1))
        });
        (decision, ())
    }
}

impl Schedule for HourOfDay {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        let decision = calendar_step(self.clock.as_ref(), |now| {
            let time = NaiveTime::from_hms_opt(self.target, 0, 0)?;
            strictly_after(now, now.date_naive().and_time(time).and_utc(), TimeDelta::days(1))
        });
        (decision, ())
    }
}

/// Runs at midnight (UTC) at the start of a given weekday.
#[derive(Debug, Clone)]
pub struct DayOfWeek {
    target: Weekday,
    clock: Arc<dyn Clock>,
}

/// Run every week at the start of `day`.
pub fn day_of_week(day: Weekday) -> DayOfWeek {
    DayOfWeek {
        target: day,
        clock: system_clock(),
    }
}

impl DayOfWeek {
    /// Read time from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Schedule for DayOfWeek {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        let decision = calendar_step(self.clock.as_ref(), |now| {
            let today = now.weekday().num_days_from_monday();
            let target = self.target.num_days_from_monday();
            let days_ahead = (target + 7 - today) % 7;
            let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
            let candidate = midnight.checked_add_signed(TimeDelta::days(i64::from(days_ahead)))?;
            strictly_after(now, candidate, TimeDelta::weeks(1))
        });
        (decision, ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleExt;
    use crate::testing::ManualClock;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        // 2024-01-03 is a Wednesday
        Utc.with_ymd_and_hms(2024, 1, 3, h, m, s).unwrap()
    }

    fn clock(times: Vec<DateTime<Utc>>) -> Arc<dyn Clock> {
        Arc::new(ManualClock::scripted(times))
    }

    fn secs(n: u64) -> PositiveDuration {
        PositiveDuration::from_secs(n)
    }

    #[test]
    fn test_fixed_aligns_to_boundaries() {
        // Runs take 2s each; boundaries every 10s from 12:00:00
        let schedule = fixed(secs(10)).with_clock(clock(vec![
            at(12, 0, 0),
            at(12, 0, 12),
            at(12, 0, 23),
        ]));
        let delays: Vec<_> = schedule.delays().take(3).collect();
        assert_eq!(delays, vec![secs(10), secs(8), secs(7)]);
    }

    #[test]
    fn test_fixed_skips_missed_boundaries() {
        let schedule = fixed(secs(10)).with_clock(clock(vec![
            at(12, 0, 0),
            // the run scheduled for 12:00:10 overran past 12:00:20
            at(12, 0, 35),
            at(12, 0, 37),
        ]));
        let decisions: Vec<_> = schedule.decisions().take(3).collect();
        assert_eq!(
            decisions,
            vec![
                ScheduleResult::delay_for(secs(10)),
                ScheduleResult::RunAgain,
                ScheduleResult::delay_for(secs(3)),
            ]
        );
    }

    #[test]
    fn test_windowed_never_runs_immediately() {
        let schedule = windowed(secs(10)).with_clock(clock(vec![
            at(12, 0, 0),
            at(12, 0, 35),
            at(12, 0, 40),
        ]));
        let delays: Vec<_> = schedule.delays().take(3).collect();
        assert_eq!(delays, vec![secs(10), secs(5), secs(10)]);
    }

    #[test]
    fn test_zero_interval_runs_again() {
        let schedule = fixed(PositiveDuration::ZERO).with_clock(clock(vec![at(0, 0, 0)]));
        assert_eq!(schedule.decisions().next(), Some(ScheduleResult::RunAgain));
    }

    #[test]
    fn test_second_of_minute() {
        let schedule = second_of_minute(30)
            .unwrap()
            .with_clock(clock(vec![at(8, 0, 10), at(8, 0, 30), at(8, 0, 45)]));
        let delays: Vec<_> = schedule.delays().take(3).collect();
        assert_eq!(delays, vec![secs(20), secs(60), secs(45)]);
    }

    #[test]
    fn test_minute_of_hour() {
        let schedule = minute_of_hour(15)
            .unwrap()
            .with_clock(clock(vec![at(8, 10, 0), at(8, 20, 0)]));
        let delays: Vec<_> = schedule.delays().take(2).collect();
        assert_eq!(delays, vec![secs(5 * 60), secs(55 * 60)]);
    }

    #[test]
    fn test_hour_of_day() {
        let schedule = hour_of_day(6)
            .unwrap()
            .with_clock(clock(vec![at(5, 0, 0), at(6, 0, 0)]));
        let delays: Vec<_> = schedule.delays().take(2).collect();
        assert_eq!(delays, vec![secs(3600), secs(24 * 3600)]);
    }

    #[test]
    fn test_day_of_week() {
        let day = 24 * 3600;
        let schedule = day_of_week(Weekday::Fri).with_clock(clock(vec![at(12, 0, 0)]));
        assert_eq!(schedule.delays().next(), Some(secs(day + 12 * 3600)));

        let same_day = day_of_week(Weekday::Wed).with_clock(clock(vec![at(0, 0, 0)]));
        assert_eq!(same_day.delays().next(), Some(secs(7 * day)));
    }

    #[test]
    fn test_out_of_range_units() {
        assert_eq!(
            second_of_minute(60).unwrap_err(),
            CalendarError {
                unit: "second",
                value: 60,
                limit: 60
            }
        );
        assert!(minute_of_hour(61).is_err());
        assert!(hour_of_day(24).is_err());
        assert!(hour_of_day(23).is_ok());
        assert_eq!(
            hour_of_day(30).unwrap_err().to_string(),
            "hour must be less than 24, got 30"
        );
    }
}
