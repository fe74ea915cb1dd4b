//! Sequencing combinator.

use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Runs the first schedule until it completes, then the second.
///
/// Created by [`ScheduleExt::then`](crate::ScheduleExt::then). The second
/// schedule sees a context rebased to the moment the first one completed,
/// so it starts at iteration zero with no accumulated delay.
#[derive(Debug, Clone)]
pub struct Then<F, S> {
    first: F,
    second: S,
}

/// State of a [`Then`] schedule.
#[derive(Debug)]
pub enum ThenState<F, S> {
    /// The first schedule is still running.
    First(F),
    /// The second schedule is running; `origin` is where it took over.
    Second {
        /// State of the second schedule.
        state: S,
        /// The outer context at the moment of the switch.
        origin: ScheduleContext,
    },
}

impl<F, S> Then<F, S> {
    pub(crate) fn new(first: F, second: S) -> Self {
        Self { first, second }
    }
}

impl<F: Schedule, S: Schedule> Schedule for Then<F, S> {
    type State = ThenState<F::State, S::State>;

    fn start(&self) -> Self::State {
        ThenState::First(self.first.start())
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        match state {
            ThenState::First(state) => match self.first.step(state, context) {
                (ScheduleResult::Complete, _) => {
                    let origin = *context;
                    self.step_second(self.second.start(), origin, context)
                }
                (decision, state) => (decision, ThenState::First(state)),
            },
            ThenState::Second { state, origin } => self.step_second(state, origin, context),
        }
    }
}

impl<F: Schedule, S: Schedule> Then<F, S> {
    fn step_second(
        &self,
        state: S::State,
        origin: ScheduleContext,
        context: &ScheduleContext,
    ) -> (ScheduleResult, ThenState<F::State, S::State>) {
        let (decision, state) = self.second.step(state, &context.since(&origin));
        (decision, ThenState::Second { state, origin })
    }
}
