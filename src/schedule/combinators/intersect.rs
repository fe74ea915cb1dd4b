//! Intersection combinator.

use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Stops when either side stops, otherwise continues after the longer
/// delay.
///
/// Created by [`ScheduleExt::intersect`](crate::ScheduleExt::intersect).
#[derive(Debug, Clone)]
pub struct Intersect<L, R> {
    left: L,
    right: R,
}

impl<L, R> Intersect<L, R> {
    pub(crate) fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L: Schedule, R: Schedule> Schedule for Intersect<L, R> {
    type State = (L::State, R::State);

    fn start(&self) -> Self::State {
        (self.left.start(), self.right.start())
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        let (left_state, right_state) = state;
        let (left, left_state) = self.left.step(left_state, context);
        let (right, right_state) = self.right.step(right_state, context);
        (left.intersect(right), (left_state, right_state))
    }
}
