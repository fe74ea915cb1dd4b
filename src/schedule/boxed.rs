//! Type-erased schedules.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// A running instance of an erased schedule.
trait Cursor: Send {
    fn advance(&mut self, context: &ScheduleContext) -> ScheduleResult;
}

struct Running<S: Schedule> {
    schedule: Arc<S>,
    state: Option<S::State>,
}

impl<S> Cursor for Running<S>
where
    S: Schedule + Send + Sync,
    S::State: Send,
{
    fn advance(&mut self, context: &ScheduleContext) -> ScheduleResult {
        let Some(state) = self.state.take() else {
            return ScheduleResult::Complete;
        };
        let (decision, next) = self.schedule.step(state, context);
        self.state = Some(next);
        decision
    }
}

type StartFn = dyn Fn() -> Box<dyn Cursor> + Send + Sync;

/// A schedule with its concrete type erased.
///
/// Composed schedules have deeply nested types. Boxing gives them one
/// nameable type, so they can be stored in structs, returned from functions
/// that pick a schedule at runtime, or built from configuration. Cloning is
/// cheap and clones share the underlying schedule.
///
/// # Example
///
/// ```rust
/// use tidewater::prelude::*;
///
/// fn policy(aggressive: bool) -> BoxedSchedule {
///     if aggressive {
///         spaced(PositiveDuration::from_millis(10)).union(recurs(10)).boxed()
///     } else {
///         exponential(PositiveDuration::from_millis(100), 2.0)
///             .union(recurs(3))
///             .boxed()
///     }
/// }
///
/// assert_eq!(policy(true).delays().count(), 10);
/// assert_eq!(policy(false).delays().count(), 3);
/// ```
#[derive(Clone)]
pub struct BoxedSchedule {
    start: Arc<StartFn>,
    name: &'static str,
}

/// State of a [`BoxedSchedule`].
pub struct BoxedState(Box<dyn Cursor>);

impl fmt::Debug for BoxedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedState(..)")
    }
}

impl BoxedSchedule {
    /// Erase `schedule`'s type.
    pub fn new<S>(schedule: S) -> Self
    where
        S: Schedule + Send + Sync + 'static,
        S::State: Send + 'static,
    {
        let schedule = Arc::new(schedule);
        Self {
            start: Arc::new(move || {
                let state = schedule.start();
                Box::new(Running {
                    schedule: Arc::clone(&schedule),
                    state: Some(state),
                }) as Box<dyn Cursor>
            }),
            name: type_name::<S>(),
        }
    }
}

impl fmt::Debug for BoxedSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxedSchedule").field(&self.name).finish()
    }
}

impl Schedule for BoxedSchedule {
    type State = BoxedState;

    fn start(&self) -> BoxedState {
        BoxedState((self.start)())
    }

    fn step(
        &self,
        mut state: BoxedState,
        context: &ScheduleContext,
    ) -> (ScheduleResult, BoxedState) {
        let decision = state.0.advance(context);
        (decision, state)
    }
}
