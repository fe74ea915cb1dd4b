//! Delay cap.

use crate::duration::PositiveDuration;
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Clamps every delay of the inner schedule to a maximum.
///
/// Created by [`ScheduleExt::max_delay`](crate::ScheduleExt::max_delay).
#[derive(Debug, Clone)]
pub struct MaxDelay<S> {
    inner: S,
    cap: PositiveDuration,
}

impl<S> MaxDelay<S> {
    pub(crate) fn new(inner: S, cap: PositiveDuration) -> Self {
        Self { inner, cap }
    }
}

impl<S: Schedule> Schedule for MaxDelay<S> {
    type State = S::State;

    fn start(&self) -> Self::State {
        self.inner.start()
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        let (decision, state) = self.inner.step(state, context);
        let capped = match decision {
            ScheduleResult::DelayAndRunAgain(d) => {
                ScheduleResult::DelayAndRunAgain(d.min(self.cap))
            }
            other => other,
        };
        (capped, state)
    }
}
