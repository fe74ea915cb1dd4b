//! Constructor functions for the context-only built-in schedules.
//!
//! Most schedules here are a function of the context's iteration count
//! alone, so they carry no state (`State = ()`). `fibonacci` threads its last
//! two delays through its state.

use crate::duration::PositiveDuration;
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Completes on the first decision: the effect runs exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Once;

/// Always runs again without delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Forever;

/// Runs again a fixed number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurs {
    times: u32,
}

/// Always runs again after the same delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spaced {
    delay: PositiveDuration,
}

/// Delays grow arithmetically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    seed: PositiveDuration,
    factor: f64,
}

/// Delays grow geometrically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    seed: PositiveDuration,
    factor: f64,
}

/// Delays follow the Fibonacci sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fibonacci {
    seed: PositiveDuration,
}

/// Replays a literal list of delays, then completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromDurations {
    delays: Vec<PositiveDuration>,
}

/// Run exactly once.
///
/// ```rust
/// use tidewater::prelude::*;
///
/// assert_eq!(once().decisions().collect::<Vec<_>>(), vec![ScheduleResult::Complete]);
/// ```
pub fn once() -> Once {
    Once
}

/// Run again forever, with no delay.
///
/// Usually bounded with [`union`](crate::ScheduleExt::union) or combined with
/// a delaying schedule.
pub fn forever() -> Forever {
    Forever
}

/// Run again `times` times, without delay, then complete.
///
/// `recurs(0)` completes immediately.
///
/// ```rust
/// use tidewater::prelude::*;
///
/// assert_eq!(recurs(3).delays().count(), 3);
/// assert_eq!(recurs(0).delays().count(), 0);
/// ```
pub fn recurs(times: u32) -> Recurs {
    Recurs { times }
}

/// Run again forever, waiting `delay` each time.
pub fn spaced(delay: impl Into<PositiveDuration>) -> Spaced {
    Spaced {
        delay: delay.into(),
    }
}

/// Delays of `seed`, `seed * (1 + factor)`, `seed * (1 + 2 * factor)`, ...
///
/// With `factor = 1.0` this is `seed`, `2 * seed`, `3 * seed`, ...
///
/// ```rust
/// use tidewater::prelude::*;
///
/// let delays: Vec<u64> = linear(PositiveDuration::from_millis(100), 1.0)
///     .delays()
///     .take(4)
///     .map(|d| d.as_millis())
///     .collect();
/// assert_eq!(delays, vec![100, 200, 300, 400]);
/// ```
pub fn linear(seed: impl Into<PositiveDuration>, factor: f64) -> Linear {
    Linear {
        seed: seed.into(),
        factor,
    }
}

/// Delays of `seed`, `seed * factor`, `seed * factor^2`, ...
///
/// ```rust
/// use tidewater::prelude::*;
///
/// let delays: Vec<u64> = exponential(PositiveDuration::from_millis(100), 2.0)
///     .delays()
///     .take(4)
///     .map(|d| d.as_millis())
///     .collect();
/// assert_eq!(delays, vec![100, 200, 400, 800]);
/// ```
pub fn exponential(seed: impl Into<PositiveDuration>, factor: f64) -> Exponential {
    Exponential {
        seed: seed.into(),
        factor,
    }
}

/// Delays of `seed`, `seed`, `2 * seed`, `3 * seed`, `5 * seed`, ...
pub fn fibonacci(seed: impl Into<PositiveDuration>) -> Fibonacci {
    Fibonacci { seed: seed.into() }
}

/// Wait each listed delay in turn, then complete.
///
/// ```rust
/// use tidewater::prelude::*;
///
/// let schedule = from_durations([
///     PositiveDuration::from_millis(10),
///     PositiveDuration::from_millis(50),
/// ]);
/// assert_eq!(schedule.delays().count(), 2);
/// ```
pub fn from_durations<I>(delays: I) -> FromDurations
where
    I: IntoIterator,
    I::Item: Into<PositiveDuration>,
{
    FromDurations {
        delays: delays.into_iter().map(Into::into).collect(),
    }
}

impl FromDurations {
    /// The delays this schedule replays.
    pub fn durations(&self) -> &[PositiveDuration] {
        &self.delays
    }
}

impl Schedule for Once {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        (ScheduleResult::Complete, ())
    }
}

impl Schedule for Forever {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        (ScheduleResult::RunAgain, ())
    }
}

impl Schedule for Recurs {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), context: &ScheduleContext) -> (ScheduleResult, ()) {
        if context.iterations() < self.times {
            (ScheduleResult::RunAgain, ())
        } else {
            (ScheduleResult::Complete, ())
        }
    }
}

impl Schedule for Spaced {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), _context: &ScheduleContext) -> (ScheduleResult, ()) {
        (ScheduleResult::DelayAndRunAgain(self.delay), ())
    }
}

impl Schedule for Linear {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), context: &ScheduleContext) -> (ScheduleResult, ()) {
        let step = self.seed * (self.factor * f64::from(context.iterations()));
        (ScheduleResult::DelayAndRunAgain(self.seed + step), ())
    }
}

impl Schedule for Exponential {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), context: &ScheduleContext) -> (ScheduleResult, ()) {
        let exponent = i32::try_from(context.iterations()).unwrap_or(i32::MAX);
        let delay = self.seed * self.factor.powi(exponent);
        (ScheduleResult::DelayAndRunAgain(delay), ())
    }
}

impl Schedule for Fibonacci {
    /// The previous delay and the one to wait next.
    type State = (PositiveDuration, PositiveDuration);

    fn start(&self) -> Self::State {
        (PositiveDuration::ZERO, self.seed)
    }

    fn step(
        &self,
        (previous, current): Self::State,
        _context: &ScheduleContext,
    ) -> (ScheduleResult, Self::State) {
        let next = (current, previous.saturating_add(current));
        (ScheduleResult::DelayAndRunAgain(current), next)
    }
}

impl Schedule for FromDurations {
    type State = ();

    fn start(&self) {}

    fn step(&self, _state: (), context: &ScheduleContext) -> (ScheduleResult, ()) {
        match self.delays.get(context.iterations() as usize) {
            Some(delay) => (ScheduleResult::DelayAndRunAgain(*delay), ()),
            None => (ScheduleResult::Complete, ()),
        }
    }
}
