//! The async driver.

use std::future::Future;
use std::ops::ControlFlow;

use tokio_util::sync::CancellationToken;

use crate::driver::cycle::{Cycle, Fold, Last, Plan};
use crate::driver::error::RunError;
use crate::driver::observer::{NoObserver, Observer};
use crate::driver::sleep::AsyncSleeper;
#[cfg(feature = "async")]
use crate::driver::sleep::TokioSleeper;
use crate::schedule::ResultSchedule;

/// Runs async effects according to a schedule.
///
/// The async counterpart of [`Runner`](crate::Runner): the same operations
/// and the same decisions, but effects return futures and delays are awaited
/// on an [`AsyncSleeper`]. A cancelled token interrupts a pending sleep
/// immediately.
///
/// # Example
///
/// ```rust
/// use tidewater::prelude::*;
///
/// # tokio_test::block_on(async {
/// let schedule = exponential(PositiveDuration::from_millis(1), 2.0).union(recurs(3));
///
/// let result = AsyncRunner::new()
///     .retry(&schedule, || async { Err::<(), _>("unavailable") })
///     .await;
///
/// assert_eq!(result, Err(RunError::Failed("unavailable")));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct AsyncRunner<Sl, O = NoObserver> {
    sleeper: Sl,
    observer: O,
    cancel: CancellationToken,
}

#[cfg(feature = "async")]
impl AsyncRunner<TokioSleeper> {
    /// A runner that sleeps on the tokio timer, with no observer and a fresh
    /// cancellation token.
    pub fn new() -> Self {
        Self::from_sleeper(TokioSleeper)
    }
}

#[cfg(feature = "async")]
impl Default for AsyncRunner<TokioSleeper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sl: AsyncSleeper> AsyncRunner<Sl> {
    /// A runner that waits with `sleeper`.
    pub fn from_sleeper(sleeper: Sl) -> Self {
        Self {
            sleeper,
            observer: NoObserver,
            cancel: CancellationToken::new(),
        }
    }
}

impl<Sl, O> AsyncRunner<Sl, O> {
    /// Wait with `sleeper` instead.
    pub fn with_sleeper<T: AsyncSleeper>(self, sleeper: T) -> AsyncRunner<T, O> {
        AsyncRunner {
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
    pub fn observe<T>(self, observer: T) -> AsyncRunner<Sl, T> {
        AsyncRunner {
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

impl<Sl: AsyncSleeper, O> AsyncRunner<Sl, O> {
    /// Run `effect` repeatedly while it succeeds, until the schedule
    /// completes. Returns the last success, or the first failure.
    pub async fn repeat<S, A, E, F, Fut>(&self, schedule: &S, effect: F) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        O: Observer<A, E>,
    {
        self.drive(schedule, effect, Last(|outcome: &Result<A, E>| outcome.is_ok()))
            .await
    }

    /// Like [`repeat`](Self::repeat), but also stops once `predicate` fails
    /// for a success value.
    pub async fn repeat_while<S, A, E, F, Fut, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.drive(
            schedule,
            effect,
            Last(|outcome: &Result<A, E>| outcome.as_ref().is_ok_and(|value| predicate(value))),
        )
        .await
    }

    /// Like [`repeat`](Self::repeat), but also stops once `predicate` holds
    /// for a success value.
    pub async fn repeat_until<S, A, E, F, Fut, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.repeat_while(schedule, effect, |value: &A| !predicate(value))
            .await
    }

    /// Run `effect` again after each failure until it succeeds or the
    /// schedule completes. Returns the first success, or the last failure.
    pub async fn retry<S, A, E, F, Fut>(&self, schedule: &S, effect: F) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        O: Observer<A, E>,
    {
        self.drive(schedule, effect, Last(|outcome: &Result<A, E>| outcome.is_err()))
            .await
    }

    /// Like [`retry`](Self::retry), but only retries errors for which
    /// `predicate` holds.
    pub async fn retry_while<S, A, E, F, Fut, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        P: Fn(&E) -> bool,
        O: Observer<A, E>,
    {
        self.drive(
            schedule,
            effect,
            Last(|outcome: &Result<A, E>| outcome.as_ref().is_err_and(|error| predicate(error))),
        )
        .await
    }

    /// Like [`retry`](Self::retry), but stops retrying once `predicate` holds
    /// for an error.
    pub async fn retry_until<S, A, E, F, Fut, P>(
        &self,
        schedule: &S,
        effect: F,
        predicate: P,
    ) -> Result<A, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        P: Fn(&E) -> bool,
        O: Observer<A, E>,
    {
        self.retry_while(schedule, effect, |error: &E| !predicate(error))
            .await
    }

    /// Repeat `effect`, folding each success into an accumulator.
    pub async fn fold<S, A, E, T, F, Fut, G>(
        &self,
        schedule: &S,
        init: T,
        fold: G,
        effect: F,
    ) -> Result<T, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        G: FnMut(T, A) -> T,
        O: Observer<A, E>,
    {
        self.fold_while(schedule, init, fold, effect, |_: &A| true)
            .await
    }

    /// Like [`fold`](Self::fold), but stops after the first success for
    /// which `predicate` fails. That value is still folded.
    pub async fn fold_while<S, A, E, T, F, Fut, G, P>(
        &self,
        schedule: &S,
        init: T,
        fold: G,
        effect: F,
        predicate: P,
    ) -> Result<T, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
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
        .await
    }

    /// Like [`fold`](Self::fold), but stops after the first success for
    /// which `predicate` holds. That value is still folded.
    pub async fn fold_until<S, A, E, T, F, Fut, G, P>(
        &self,
        schedule: &S,
        init: T,
        fold: G,
        effect: F,
        predicate: P,
    ) -> Result<T, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
        G: FnMut(T, A) -> T,
        P: Fn(&A) -> bool,
        O: Observer<A, E>,
    {
        self.fold_while(schedule, init, fold, effect, |value: &A| !predicate(value))
            .await
    }

    async fn drive<S, A, E, F, Fut, P>(
        &self,
        schedule: &S,
        mut effect: F,
        mut plan: P,
    ) -> Result<P::Output, RunError<E>>
    where
        S: ResultSchedule<A, E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<A, E>>,
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

            let outcome = effect().await;
            let decision = cycle.decide(&plan, &outcome, &self.observer);
            plan = match plan.absorb(outcome, decision.is_complete()) {
                ControlFlow::Break(result) => return result,
                ControlFlow::Continue(plan) => plan,
            };

            let delay = decision.delay_or_zero().as_duration();
            if let Err(cancelled) = self.sleeper.sleep(delay, &self.cancel).await {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt = cycle.attempt(), "run cancelled while sleeping");
                return Err(cancelled.into());
            }
        }
    }
}
