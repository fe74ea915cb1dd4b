//! Union combinator.

use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Stops when either side stops, otherwise continues after the shorter
/// delay.
///
/// Created by [`ScheduleExt::union`](crate::ScheduleExt::union). Both sides
/// are stepped against the same context on every decision.
#[derive(Debug, Clone)]
pub struct Union<L, R> {
    left: L,
    right: R,
}

impl<L, R> Union<L, R> {
    pub(crate) fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L: Schedule, R: Schedule> Schedule for Union<L, R> {
    type State = (L::State, R::State);

    fn start(&self) -> Self::State {
        (self.left.start(), self.right.start())
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        let (left_state, right_state) = state;
        let (left, left_state) = self.left.step(left_state, context);
        let (right, right_state) = self.right.step(right_state, context);
        (left.union(right), (left_state, right_state))
    }
}
