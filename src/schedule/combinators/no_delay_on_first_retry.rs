//! Immediate first retry.

use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Replaces the first continuation's delay with an immediate `RunAgain`.
///
/// Created by
/// [`ScheduleExt::no_delay_on_first_retry`](crate::ScheduleExt::no_delay_on_first_retry).
/// The inner schedule is still stepped on the first decision, so its state
/// and any completion are preserved.
#[derive(Debug, Clone)]
pub struct NoDelayOnFirstRetry<S> {
    inner: S,
}

impl<S> NoDelayOnFirstRetry<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Schedule> Schedule for NoDelayOnFirstRetry<S> {
    type State = S::State;

    fn start(&self) -> Self::State {
        self.inner.start()
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        let (decision, state) = self.inner.step(state, context);
        if context.has_not_started() && decision.is_continue() {
            (ScheduleResult::RunAgain, state)
        } else {
            (decision, state)
        }
    }
}
