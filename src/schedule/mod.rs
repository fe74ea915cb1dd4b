//! Composable schedules.
//!
//! A schedule is a pure step function: given its own state and the current
//! [`ScheduleContext`], it returns a [`ScheduleResult`] and the next state.
//! Schedules never sleep and never run anything; the drivers in
//! [`crate::driver`] do that.
//!
//! # Explicit state
//!
//! Stateful schedules (`fixed`, `windowed`, decorrelated backoff, sequencing)
//! do not close over mutable variables. The step function returns the new
//! state and the caller threads it into the next call:
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tidewater::schedule::Schedule;
//!
//! let schedule = recurs(2);
//! let mut state = schedule.start();
//! let mut ctx = ScheduleContext::initial();
//!
//! let mut decisions = Vec::new();
//! loop {
//!     let (decision, next) = schedule.step(state, &ctx);
//!     state = next;
//!     ctx = ctx.next(decision);
//!     decisions.push(decision);
//!     if decision.is_complete() {
//!         break;
//!     }
//! }
//!
//! assert_eq!(
//!     decisions,
//!     vec![ScheduleResult::RunAgain, ScheduleResult::RunAgain, ScheduleResult::Complete]
//! );
//! ```
//!
//! Because the schedule value itself is immutable, one schedule can drive
//! any number of independent runs.
//!
//! # Capabilities
//!
//! - **Context-only** schedules implement [`Schedule`]. Most of the library
//!   lives here: `spaced`, `exponential`, `recurs`, and every transformer.
//! - **Result-aware** schedules implement [`ResultSchedule`] and also see
//!   the effect's latest `Result`. Every [`Schedule`] is a [`ResultSchedule`]
//!   for any result type; [`ScheduleExt::recur_while`] and
//!   [`ScheduleExt::recur_until`] build the result-aware ones.
//! - **Environment-aware** schedules (`fixed`, `windowed` and the calendar
//!   schedules) read an injected [`Clock`](crate::clock::Clock), set with
//!   their `with_clock` method.
//!
//! # Composition
//!
//! ```rust
//! use tidewater::prelude::*;
//!
//! // Exponential backoff, at most 5 retries, never more than 2s between tries
//! let schedule = exponential(PositiveDuration::from_millis(100), 2.0)
//!     .union(recurs(5))
//!     .max_delay(PositiveDuration::from_secs(2));
//!
//! let delays: Vec<u64> = schedule.delays().map(|d| d.as_millis()).collect();
//! assert_eq!(delays, vec![100, 200, 400, 800, 1600]);
//! ```

mod boxed;
mod calendar;
pub mod combinators;
mod constructors;
mod context;
mod decorrelated;
mod ext;
mod result;

pub use boxed::{BoxedSchedule, BoxedState};
pub use calendar::{
    day_of_week, fixed, hour_of_day, minute_of_hour, second_of_minute, windowed, CalendarError,
    DayOfWeek, Fixed, FixedAnchor, HourOfDay, MinuteOfHour, SecondOfMinute, Windowed,
};
pub use constructors::{
    exponential, fibonacci, forever, from_durations, linear, once, recurs, spaced, Exponential,
    Fibonacci, Forever, FromDurations, Linear, Once, Recurs, Spaced,
};
pub use context::{ScheduleContext, ScheduleStatus};
pub use decorrelated::{aws_decorrelated, polly_decorrelated, AwsDecorrelated, PollyDecorrelated};
pub use ext::{Decisions, Delays, ScheduleExt};
pub use result::ScheduleResult;

/// A context-only schedule.
///
/// Implementations are immutable descriptors. All progress lives in
/// [`Schedule::State`] and the [`ScheduleContext`], both owned by the caller.
pub trait Schedule {
    /// Per-run state threaded between steps.
    type State;

    /// State for a fresh run.
    fn start(&self) -> Self::State;

    /// Decide what happens after the run described by `context`.
    fn step(&self, state: Self::State, context: &ScheduleContext)
        -> (ScheduleResult, Self::State);
}

/// A schedule that may also inspect the effect's latest result.
///
/// Every [`Schedule`] implements this trait for any `A` and `E` by ignoring
/// the result.
pub trait ResultSchedule<A, E> {
    /// Per-run state threaded between steps.
    type State;

    /// State for a fresh run.
    fn start(&self) -> Self::State;

    /// Decide what happens after a run that produced `outcome`.
    fn step(
        &self,
        state: Self::State,
        context: &ScheduleContext,
        outcome: &Result<A, E>,
    ) -> (ScheduleResult, Self::State);
}

impl<S, A, E> ResultSchedule<A, E> for S
where
    S: Schedule,
{
    type State = S::State;

    fn start(&self) -> Self::State {
        Schedule::start(self)
    }

    fn step(
        &self,
        state: Self::State,
        context: &ScheduleContext,
        _outcome: &Result<A, E>,
    ) -> (ScheduleResult, Self::State) {
        Schedule::step(self, state, context)
    }
}

impl<S: Schedule + ?Sized> Schedule for &S {
    type State = S::State;

    fn start(&self) -> Self::State {
        Schedule::start(&**self)
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        Schedule::step(&**self, state, context)
    }
}
