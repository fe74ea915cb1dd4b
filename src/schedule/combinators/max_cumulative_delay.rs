//! Total delay budget.

use crate::duration::PositiveDuration;
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Completes once the cumulative applied delay reaches a budget.
///
/// Created by
/// [`ScheduleExt::max_cumulative_delay`](crate::ScheduleExt::max_cumulative_delay).
/// A continuation whose delay would push the total past the budget is turned
/// into `Complete`, so the applied delays never sum to more than the cap.
#[derive(Debug, Clone)]
pub struct MaxCumulativeDelay<S> {
    inner: S,
    cap: PositiveDuration,
}

impl<S> MaxCumulativeDelay<S> {
    pub(crate) fn new(inner: S, cap: PositiveDuration) -> Self {
        Self { inner, cap }
    }
}

impl<S: Schedule> Schedule for MaxCumulativeDelay<S> {
    type State = S::State;

    fn start(&self) -> Self::State {
        self.inner.start()
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        let spent = context.cumulative_applied_delay();
        if spent >= self.cap {
            return (ScheduleResult::Complete, state);
        }
        let (decision, state) = self.inner.step(state, context);
        match decision.delay() {
            Some(delay) if spent.saturating_add(delay) > self.cap => {
                (ScheduleResult::Complete, state)
            }
            _ => (decision, state),
        }
    }
}
