//! Per-decision observation hooks.

use crate::schedule::{ScheduleContext, ScheduleResult};

/// Information about one schedule decision, passed to an [`Observer`].
///
/// Observers see every decision the schedule makes, including the final
/// `Complete`, before the driver sleeps.
#[derive(Debug)]
pub struct ScheduleEvent<'a, A, E> {
    /// Which invocation of the effect produced `outcome` (1-based).
    pub attempt: u32,
    /// The context the schedule decided with.
    pub context: &'a ScheduleContext,
    /// The effect's result for this attempt.
    pub outcome: &'a Result<A, E>,
    /// What the schedule decided.
    pub decision: ScheduleResult,
}

/// Receives a [`ScheduleEvent`] for every decision a driver makes.
///
/// Implemented for any `Fn(&ScheduleEvent<'_, A, E>)`. Observers are
/// synchronous and should not block; use them for logging and metrics.
pub trait Observer<A, E> {
    /// Called once per decision.
    fn on_decision(&self, event: &ScheduleEvent<'_, A, E>);
}

impl<A, E, F> Observer<A, E> for F
where
    F: Fn(&ScheduleEvent<'_, A, E>),
{
    fn on_decision(&self, event: &ScheduleEvent<'_, A, E>) {
        self(event)
    }
}

/// The default observer, which ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl<A, E> Observer<A, E> for NoObserver {
    fn on_decision(&self, _event: &ScheduleEvent<'_, A, E>) {}
}
