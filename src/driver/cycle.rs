//! The decision core shared by the blocking and async drivers.
//!
//! A driver alternates between invoking the effect and asking a [`Cycle`]
//! what to do next. The [`Plan`] decides whether the schedule is consulted
//! at all for an outcome, and what the run returns once it stops.

use std::ops::ControlFlow;

use crate::driver::error::RunError;
use crate::driver::observer::{Observer, ScheduleEvent};
use crate::schedule::{ResultSchedule, ScheduleContext, ScheduleResult};

/// Threads a schedule's state and context through one run.
pub(crate) struct Cycle<'s, S, A, E>
where
    S: ResultSchedule<A, E>,
{
    schedule: &'s S,
    state: Option<S::State>,
    context: ScheduleContext,
    attempt: u32,
}

impl<'s, S, A, E> Cycle<'s, S, A, E>
where
    S: ResultSchedule<A, E>,
{
    pub(crate) fn new(schedule: &'s S) -> Self {
        Self {
            schedule,
            state: Some(<S as ResultSchedule<A, E>>::start(schedule)),
            context: ScheduleContext::initial(),
            attempt: 0,
        }
    }

    /// Number of effect invocations decided so far.
    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Decide what follows `outcome`. Called exactly once per invocation.
    ///
    /// When the plan declines to consult the schedule the run stops without
    /// a schedule decision and the observer is not called.
    pub(crate) fn decide<P, O>(
        &mut self,
        plan: &P,
        outcome: &Result<A, E>,
        observer: &O,
    ) -> ScheduleResult
    where
        P: Plan<A, E>,
        O: Observer<A, E>,
    {
        self.attempt = self.attempt.saturating_add(1);

        if !plan.consult(outcome) {
            #[cfg(feature = "tracing")]
            tracing::trace!(attempt = self.attempt, "predicate stopped the run");
            return ScheduleResult::Complete;
        }

        let Some(state) = self.state.take() else {
            return ScheduleResult::Complete;
        };
        let (decision, next) =
            <S as ResultSchedule<A, E>>::step(self.schedule, state, &self.context, outcome);

        observer.on_decision(&ScheduleEvent {
            attempt: self.attempt,
            context: &self.context,
            outcome,
            decision,
        });

        self.context = self.context.next(decision);
        if decision.is_continue() {
            self.state = Some(next);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = self.attempt,
            iteration = self.context.iterations(),
            decision = %decision,
            cumulative_delay = %self.context.cumulative_applied_delay(),
            "schedule decided"
        );

        decision
    }
}

/// What a driver operation does with each outcome.
pub(crate) trait Plan<A, E>: Sized {
    type Output;

    /// Whether the schedule gets a say after `outcome`.
    fn consult(&self, outcome: &Result<A, E>) -> bool;

    /// Take ownership of `outcome`. `done` is true when the run stops here.
    fn absorb(
        self,
        outcome: Result<A, E>,
        done: bool,
    ) -> ControlFlow<Result<Self::Output, RunError<E>>, Self>;
}

/// Returns the last outcome. Used by every repeat and retry variant.
pub(crate) struct Last<G>(pub(crate) G);

impl<A, E, G> Plan<A, E> for Last<G>
where
    G: Fn(&Result<A, E>) -> bool,
{
    type Output = A;

    fn consult(&self, outcome: &Result<A, E>) -> bool {
        (self.0)(outcome)
    }

    fn absorb(
        self,
        outcome: Result<A, E>,
        done: bool,
    ) -> ControlFlow<Result<A, RunError<E>>, Self> {
        if done {
            ControlFlow::Break(outcome.map_err(RunError::Failed))
        } else {
            ControlFlow::Continue(self)
        }
    }
}

/// Folds every successful value into an accumulator.
///
/// A failure always stops the run. The value that stops a `fold_while` or
/// `fold_until` is still folded: the accumulator reflects every run that
/// actually succeeded.
pub(crate) struct Fold<T, F, G> {
    pub(crate) acc: T,
    pub(crate) fold: F,
    pub(crate) gate: G,
}

impl<A, E, T, F, G> Plan<A, E> for Fold<T, F, G>
where
    F: FnMut(T, A) -> T,
    G: Fn(&A) -> bool,
{
    type Output = T;

    fn consult(&self, outcome: &Result<A, E>) -> bool {
        outcome.as_ref().is_ok_and(|value| (self.gate)(value))
    }

    fn absorb(
        self,
        outcome: Result<A, E>,
        done: bool,
    ) -> ControlFlow<Result<T, RunError<E>>, Self> {
        let Fold {
            acc,
            mut fold,
            gate,
        } = self;
        match outcome {
            Ok(value) => {
                let acc = fold(acc, value);
                if done {
                    ControlFlow::Break(Ok(acc))
                } else {
                    ControlFlow::Continue(Fold { acc, fold, gate })
                }
            }
            Err(e) => ControlFlow::Break(Err(RunError::Failed(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::observer::NoObserver;
    use crate::schedule::{recurs, ScheduleExt};

    fn always<A, E>(_: &Result<A, E>) -> bool {
        true
    }

    #[test]
    fn test_cycle_counts_attempts_and_iterations() {
        let schedule = recurs(1);
        let mut cycle = Cycle::<_, (), ()>::new(&schedule);
        let plan = Last(always::<(), ()>);

        assert_eq!(cycle.decide(&plan, &Ok(()), &NoObserver), ScheduleResult::RunAgain);
        assert_eq!(cycle.decide(&plan, &Ok(()), &NoObserver), ScheduleResult::Complete);
        assert_eq!(cycle.attempt(), 2);
        assert_eq!(cycle.context.iterations(), 2);
    }

    #[test]
    fn test_declined_outcome_skips_schedule() {
        let schedule = recurs(5);
        let mut cycle = Cycle::<_, i32, ()>::new(&schedule);
        let plan = Last(|outcome: &Result<i32, ()>| outcome.is_err());

        assert_eq!(cycle.decide(&plan, &Ok(1), &NoObserver), ScheduleResult::Complete);
        assert!(cycle.context.has_not_started());
    }

    #[test]
    fn test_result_aware_schedule_sees_outcome() {
        let schedule = recurs(5).recur_while(|outcome: &Result<i32, ()>| outcome != &Ok(3));
        let mut cycle = Cycle::new(&schedule);
        let plan = Last(always::<i32, ()>);

        assert!(cycle.decide(&plan, &Ok(1), &NoObserver).is_continue());
        assert!(cycle.decide(&plan, &Ok(3), &NoObserver).is_complete());
    }

    #[test]
    fn test_fold_absorbs_until_done() {
        let plan = Fold {
            acc: 0,
            fold: |acc: i32, n: i32| acc + n,
            gate: |_: &i32| true,
        };
        let plan = match Plan::<i32, ()>::absorb(plan, Ok(2), false) {
            ControlFlow::Continue(plan) => plan,
            ControlFlow::Break(_) => panic!("stopped early"),
        };
        match Plan::<i32, ()>::absorb(plan, Ok(5), true) {
            ControlFlow::Break(result) => assert_eq!(result, Ok(7)),
            ControlFlow::Continue(_) => panic!("did not stop"),
        }
    }

    #[test]
    fn test_fold_stops_on_failure() {
        let plan = Fold {
            acc: 0,
            fold: |acc: i32, n: i32| acc + n,
            gate: |_: &i32| true,
        };
        assert!(!Plan::<i32, &str>::consult(&plan, &Err("x")));
        match Plan::<i32, &str>::absorb(plan, Err("x"), true) {
            ControlFlow::Break(result) => assert_eq!(result, Err(RunError::Failed("x"))),
            ControlFlow::Continue(_) => panic!("did not stop"),
        }
    }
}
