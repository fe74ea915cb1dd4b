//! Extension methods for composing and inspecting schedules.

use std::fmt;
use std::sync::Arc;

use crate::duration::PositiveDuration;
use crate::random::RandomSource;
use crate::schedule::boxed::BoxedSchedule;
use crate::schedule::combinators::{
    Intersect, Jitter, MaxCumulativeDelay, MaxDelay, NoDelayOnFirstRetry, RecurWhile, Then, Union,
};
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Combinators available on every [`Schedule`].
///
/// Every method consumes `self` and returns a new schedule that wraps it;
/// nothing is mutated.
pub trait ScheduleExt: Schedule + Sized {
    /// Stop when either schedule stops; otherwise take the shorter delay.
    ///
    /// ```rust
    /// use tidewater::prelude::*;
    ///
    /// // Retry every 10ms, but at most three times
    /// let schedule = spaced(PositiveDuration::from_millis(10)).union(recurs(3));
    /// assert_eq!(schedule.delays().count(), 3);
    /// ```
    fn union<S: Schedule>(self, other: S) -> Union<Self, S> {
        Union::new(self, other)
    }

    /// Stop when either schedule stops; otherwise take the longer delay.
    ///
    /// ```rust
    /// use tidewater::prelude::*;
    ///
    /// let schedule = spaced(PositiveDuration::from_millis(10))
    ///     .intersect(exponential(PositiveDuration::from_millis(4), 2.0))
    ///     .intersect(recurs(4));
    /// let delays: Vec<u64> = schedule.delays().map(|d| d.as_millis()).collect();
    /// assert_eq!(delays, vec![10, 10, 16, 32]);
    /// ```
    fn intersect<S: Schedule>(self, other: S) -> Intersect<Self, S> {
        Intersect::new(self, other)
    }

    /// Run this schedule to completion, then continue with `next`.
    ///
    /// ```rust
    /// use tidewater::prelude::*;
    ///
    /// let schedule = from_durations([PositiveDuration::from_millis(1)])
    ///     .then(spaced(PositiveDuration::from_millis(5)).union(recurs(2)));
    /// let delays: Vec<u64> = schedule.delays().map(|d| d.as_millis()).collect();
    /// assert_eq!(delays, vec![1, 5, 5]);
    /// ```
    fn then<S: Schedule>(self, next: S) -> Then<Self, S> {
        Then::new(self, next)
    }

    /// Clamp every delay to at most `cap`.
    fn max_delay(self, cap: impl Into<PositiveDuration>) -> MaxDelay<Self> {
        MaxDelay::new(self, cap.into())
    }

    /// Complete before the total applied delay would exceed `cap`.
    fn max_cumulative_delay(self, cap: impl Into<PositiveDuration>) -> MaxCumulativeDelay<Self> {
        MaxCumulativeDelay::new(self, cap.into())
    }

    /// Make the first continuation immediate, leaving later delays untouched.
    fn no_delay_on_first_retry(self) -> NoDelayOnFirstRetry<Self> {
        NoDelayOnFirstRetry::new(self)
    }

    /// Add a random offset in `[min, max)` to every continuing decision.
    fn jitter(
        self,
        min: impl Into<PositiveDuration>,
        max: impl Into<PositiveDuration>,
        random: Arc<RandomSource>,
    ) -> Jitter<Self> {
        Jitter::between(self, min.into(), max.into(), random)
    }

    /// Add a random offset in `[0, delay * factor)` to every continuing
    /// decision.
    fn jitter_factor(self, factor: f64, random: Arc<RandomSource>) -> Jitter<Self> {
        Jitter::proportional(self, factor, random)
    }

    /// Continue only while `predicate` holds for the effect's latest result.
    ///
    /// The result is a result-aware schedule: drivers feed it each outcome.
    /// It is not itself a [`Schedule`], so apply it last: compose with
    /// `union`, `max_delay` and the rest first, then gate the whole.
    ///
    /// ```rust
    /// use tidewater::prelude::*;
    ///
    /// #[derive(Debug, PartialEq)]
    /// enum FetchError { Timeout, NotFound }
    ///
    /// let schedule = spaced(PositiveDuration::from_millis(1))
    ///     .union(recurs(5))
    ///     .recur_while(|outcome: &Result<String, FetchError>| {
    ///         matches!(outcome, Err(FetchError::Timeout))
    ///     });
    ///
    /// let mut calls = 0;
    /// let result = retry(&schedule, || {
    ///     calls += 1;
    ///     Err::<String, _>(FetchError::NotFound)
    /// });
    ///
    /// assert_eq!(result, Err(RunError::Failed(FetchError::NotFound)));
    /// assert_eq!(calls, 1);
    /// ```
    fn recur_while<A, E, P>(self, predicate: P) -> RecurWhile<Self, P>
    where
        P: Fn(&Result<A, E>) -> bool,
    {
        RecurWhile::new(self, predicate, true)
    }

    /// Continue only until `predicate` holds for the effect's latest result.
    fn recur_until<A, E, P>(self, predicate: P) -> RecurWhile<Self, P>
    where
        P: Fn(&Result<A, E>) -> bool,
    {
        RecurWhile::new(self, predicate, false)
    }

    /// Erase the schedule's type.
    fn boxed(self) -> BoxedSchedule
    where
        Self: Send + Sync + 'static,
        Self::State: Send + 'static,
    {
        BoxedSchedule::new(self)
    }

    /// Dry run: the delays this schedule would apply, without running anything.
    ///
    /// `RunAgain` yields a zero delay. The iterator ends at the first
    /// `Complete`, so unbounded schedules produce unbounded iterators.
    fn delays(self) -> Delays<Self> {
        Delays {
            decisions: self.decisions(),
        }
    }

    /// Dry run: every decision this schedule would make, ending with (and
    /// including) the first `Complete`.
    fn decisions(self) -> Decisions<Self> {
        let state = self.start();
        Decisions {
            schedule: self,
            state: Some(state),
            context: ScheduleContext::initial(),
        }
    }
}

impl<S: Schedule> ScheduleExt for S {}

/// Iterator over a schedule's decisions. See [`ScheduleExt::decisions`].
pub struct Decisions<S: Schedule> {
    schedule: S,
    state: Option<S::State>,
    context: ScheduleContext,
}

impl<S: Schedule> Decisions<S> {
    /// The context after the most recent decision.
    pub fn context(&self) -> &ScheduleContext {
        &self.context
    }
}

impl<S: Schedule + fmt::Debug> fmt::Debug for Decisions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decisions")
            .field("schedule", &self.schedule)
            .field("context", &self.context)
            .field("finished", &self.state.is_none())
            .finish_non_exhaustive()
    }
}

impl<S: Schedule> Iterator for Decisions<S> {
    type Item = ScheduleResult;

    fn next(&mut self) -> Option<ScheduleResult> {
        let state = self.state.take()?;
        let (decision, next) = self.schedule.step(state, &self.context);
        self.context = self.context.next(decision);
        if decision.is_continue() {
            self.state = Some(next);
        }
        Some(decision)
    }
}

/// Iterator over a schedule's delays. See [`ScheduleExt::delays`].
pub struct Delays<S: Schedule> {
    decisions: Decisions<S>,
}

impl<S: Schedule + fmt::Debug> fmt::Debug for Delays<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delays")
            .field("decisions", &self.decisions)
            .finish()
    }
}

impl<S: Schedule> Iterator for Delays<S> {
    type Item = PositiveDuration;

    fn next(&mut self) -> Option<PositiveDuration> {
        self.decisions.next()?.delay()
    }
}
