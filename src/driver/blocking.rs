//! The blocking driver.

use std::ops::ControlFlow;

use tokio_util::sync::CancellationToken;

use crate::driver::cycle::{Cycle, Fold, Last, Plan};
use crate::driver::error::RunError;
use crate::driver::observer::{NoObserver, Observer};
use crate::driver::sleep::{Sleeper, ThreadSleeper};
use crate::schedule::ResultSchedule;

/// Runs effects on the current thread according to a schedule.
///
/// A runner owns how to wait (its [`Sleeper`]), how to stop (its
/// [`CancellationToken`]) and who is told about decisions (its
/// [`Observer`]). The schedule and the effect are supplied per call, so one
/// runner can drive any number of runs.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use tidewater::prelude::*;
///
/// let calls = Cell::new(0);
/// let schedule = spaced(PositiveDuration::from_millis(1)).union(recurs(5));
///
/// let result = Runner::new().retry(&schedule, || {
///     calls.set(calls.get() + 1);
///     if calls.get() < 3 {
///         Err("not yet")
///     } else {
///         Ok(calls.get())
///     }
/// });
///
/// assert_eq!(result, Ok(3));
/// ```
#[derive(Debug, Clone)]
pub struct Runner<Sl = ThreadSleeper, O = NoObserver> {
    sleeper: Sl,
    observer: O,
    cancel: CancellationToken,
}

impl Runner {
    /// A runner that sleeps the current thread, with no observer and a fresh
    /// cancellation token.
    pub fn new() -> Self {
        Self {
            sleeper: ThreadSleeper::default(),
            observer: NoObserver,
            cancel: CancellationToken::new(),
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sl, O> Runner<Sl, O> {
    /// Wait with `sleeper` instead.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Runner<T, O> {
        Runner {
            sleeper,
            observer: self.observer,
            cancel: self.cancel,
        }
    }

    /// Stop runs when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report every decision to `observer`.
    pub fn observe<T>(self, observer: T) -> Runner<Sl, T> {
        Runner {
            sleeper: self.sleeper,
            observer,
            cancel: self.cancel,
        }
    }

    /// The token that cancels this runner's runs.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl<Sl: Sleeper, O> Runner<Sl, O> {
    /// Run `effect` repeatedly while it succeeds, until the schedule
    /// completes. Returns the last success, or the first failure.
    pub fn repeat<S, A, E, F>(&self, schedule: &S, effect: F) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        O: Observer<A, E>,
    {
        self.drive(schedule, effect, Last(|outcome: &Result<A, E>| outcome.is_ok()))
    }

    /// Like [`repeat`](Self::repeat), but also stops once `predicate` fails
    /// for a success value.
    pub fn repeat_while<S, A, E, F, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.drive(
            schedule,
            effect,
            Last(|outcome: &Result<A, E>| outcome.as_ref().is_ok_and(|value| predicate(value))),
        )
    }

    /// Like [`repeat`](Self::repeat), but also stops once `predicate` holds
    /// for a success value.
    pub fn repeat_until<S, A, E, F, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.repeat_while(schedule, effect, |value| !predicate(value))
    }

    /// Run `effect` again after each failure until it succeeds or the
    /// schedule completes. Returns the first success, or the last failure.
    pub fn retry<S, A, E, F>(&self, schedule: &S, effect: F) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        O: Observer<A, E>,
    {
        self.drive(schedule, effect, Last(|outcome: &Result<A, E>| outcome.is_err()))
    }

    /// Like [`retry`](Self::retry), but only retries errors for which
    /// `predicate` holds.
    pub fn retry_while<S, A, E, F, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        P: Fn(&E) -> bool,
        O: Observer<A, E>,
    {
        self.drive(
            schedule,
            effect,
            Last(|outcome: &Result<A, E>| outcome.as_ref().is_err_and(|error| predicate(error))),
        )
    }

    /// Like [`retry`](Self::retry), but stops retrying once `predicate` holds
    /// for an error.
    pub fn retry_until<S, A, E, F, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        P: Fn(&E) -> bool,
        O: Observer<A, E>,
    {
        self.retry_while(schedule, effect, |error| !predicate(error))
    }

    /// Repeat `effect` like [`repeat`](Self::repeat), folding each success
    /// into an accumulator.
    ///
    /// ```rust
    /// use tidewater::prelude::*;
    ///
    /// let mut next = 0;
    /// let total = Runner::new().fold(&recurs(3), 0, |sum, n| sum + n, || {
    ///     next += 1;
    ///     Ok::<_, ()>(next)
    /// });
    ///
    /// // Four runs: the first plus three repeats
    /// assert_eq!(total, Ok(1 + 2 + 3 + 4));
    /// ```
    pub fn fold<S, A, E, T, F, G>(
        &self,
        schedule: &S,
        init: T,
        fold: G,
        effect: F,
    ) -> Result<T, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        G: FnMut(T, A) -> T,
        O: Observer<A, E>,
    {
        self.fold_while(schedule, init, fold, effect, |_| true)
    }

    /// Like [`fold`](Self::fold), but stops after the first success for
    /// which `predicate` fails. That value is still folded.
    pub fn fold_while<S, A, E, T, F, G, P>(
        &self,
        schedule: &S,
        init: T,
        fold: G,
        effect: F,
        predicate: P,
    ) -> Result<T, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        G: FnMut(T, A) -> T,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.drive(
            schedule,
            effect,
            Fold {
                acc: init,
                fold,
                gate: predicate,
            },
        )
    }

    /// Like [`fold`](Self::fold), but stops after the first success for
    /// which `predicate` holds. That value is still folded.
    pub fn fold_until<S, A, E, T, F, G, P>(
        &self,
        schedule: &S,
        init: T,
        fold: G,
        effect: F,
        predicate: P,
    ) -> Result<T, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        G: FnMut(T, A) -> T,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.fold_while(schedule, init, fold, effect, |value| !predicate(value))
    }

    fn drive<S, A, E, F, P>(
        &self,
        schedule: &S,
        mut effect: F,
        mut plan: P,
    ) -> Result<P::Output, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Result<A, E>,
        P: Plan<A, E>,
        O: Observer<A, E>,
    {
        let mut cycle = Cycle::new(schedule);
        loop {
            if self.cancel.is_cancelled() {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt = cycle.attempt(), "run cancelled");
                return Err(RunError::Cancelled);
            }

            let outcome = effect();
            let decision = cycle.decide(&plan, &outcome, &self.observer);
            plan = match plan.absorb(outcome, decision.is_complete()) {
                ControlFlow::Break(result) => return result,
                ControlFlow::Continue(plan) => plan,
            };

            let delay = decision.delay_or_zero().as_duration();
            if let Err(cancelled) = self.sleeper.sleep(delay, &self.cancel) {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt = cycle.attempt(), "run cancelled while sleeping");
                return Err(cancelled.into());
            }
        }
    }
}
