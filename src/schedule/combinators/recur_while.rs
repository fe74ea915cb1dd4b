//! Result-aware gating.

use std::fmt;

use crate::schedule::{ResultSchedule, Schedule, ScheduleContext, ScheduleResult};

/// Continues per the inner schedule only while a predicate over the
/// effect's latest result holds (or, for `recur_until`, until it holds).
///
/// Created by [`ScheduleExt::recur_while`](crate::ScheduleExt::recur_while)
/// and [`ScheduleExt::recur_until`](crate::ScheduleExt::recur_until). This is
/// a [`ResultSchedule`] only; it cannot be dry-run because it needs results,
/// and the context combinators do not accept it. Gating is the outermost
/// layer of a schedule.
#[derive(Clone)]
pub struct RecurWhile<S, P> {
    inner: S,
    predicate: P,
    continue_when: bool,
}

impl<S, P> RecurWhile<S, P> {
    pub(crate) fn new(inner: S, predicate: P, continue_when: bool) -> Self {
        Self {
            inner,
            predicate,
            continue_when,
        }
    }
}

impl<S: fmt::Debug, P> fmt::Debug for RecurWhile<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurWhile")
            .field("inner", &self.inner)
            .field("continue_when", &self.continue_when)
            .finish_non_exhaustive()
    }
}

impl<S, P, A, E> ResultSchedule<A, E> for RecurWhile<S, P>
where
    S: Schedule,
    P: Fn(&Result<A, E>) -> bool,
{
    type State = S::State;

    fn start(&self) -> Self::State {
        Schedule::start(&self.inner)
    }

    fn step(
        &self,
        state: Self::State,
        context: &ScheduleContext,
        outcome: &Result<A, E>,
    ) -> (ScheduleResult, Self::State) {
        if (self.predicate)(outcome) != self.continue_when {
            return (ScheduleResult::Complete, state);
        }
        Schedule::step(&self.inner, state, context)
    }
}
