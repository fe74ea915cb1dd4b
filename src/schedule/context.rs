//! Immutable bookkeeping for a running schedule.

use crate::duration::PositiveDuration;
use crate::schedule::result::ScheduleResult;

/// A snapshot of how far a schedule has progressed.
///
/// Contexts are never mutated. Each decision produces a new context via
/// [`ScheduleContext::next`], which counts the decision and adds its delay to
/// the running total. A context only records progress; deciding when to stop
/// is the schedule's job.
///
/// # Examples
///
/// ```rust
/// use tidewater::{PositiveDuration, ScheduleContext, ScheduleResult};
///
/// let ctx = ScheduleContext::initial();
/// assert!(ctx.has_not_started());
///
/// let ctx = ctx.next(ScheduleResult::delay_for(PositiveDuration::from_millis(20)));
/// let ctx = ctx.next(ScheduleResult::RunAgain);
///
/// assert_eq!(ctx.iterations(), 2);
/// assert_eq!(ctx.cumulative_applied_delay(), PositiveDuration::from_millis(20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleContext {
    iteration: u32,
    last_result: Option<ScheduleResult>,
    cumulative_applied_delay: PositiveDuration,
}

/// Coarse lifecycle of a schedule, derived from its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// No decision has been made yet.
    NotStarted,
    /// At least one decision was made and the last one continued.
    Running,
    /// The last decision was `Complete`.
    Completed,
}

impl ScheduleContext {
    /// The context before any decision has been made.
    pub const fn initial() -> Self {
        Self {
            iteration: 0,
            last_result: None,
            cumulative_applied_delay: PositiveDuration::ZERO,
        }
    }

    /// The context that follows `result`.
    pub fn next(&self, result: ScheduleResult) -> Self {
        Self {
            iteration: self.iteration.saturating_add(1),
            last_result: Some(result),
            cumulative_applied_delay: self
                .cumulative_applied_delay
                .saturating_add(result.delay_or_zero()),
        }
    }

    /// Number of decisions taken so far.
    pub fn iterations(&self) -> u32 {
        self.iteration
    }

    /// The decision that produced this context.
    pub fn last_result(&self) -> Option<ScheduleResult> {
        self.last_result
    }

    /// Delay of the previous decision, if it continued.
    pub fn last_delay(&self) -> Option<PositiveDuration> {
        self.last_result.and_then(|r| r.delay())
    }

    /// Sum of every delay applied so far.
    pub fn cumulative_applied_delay(&self) -> PositiveDuration {
        self.cumulative_applied_delay
    }

    /// Returns true only for the initial context.
    pub fn has_not_started(&self) -> bool {
        self.iteration == 0 && self.last_result.is_none()
    }

    /// Lifecycle status.
    pub fn status(&self) -> ScheduleStatus {
        match self.last_result {
            None => ScheduleStatus::NotStarted,
            Some(ScheduleResult::Complete) => ScheduleStatus::Completed,
            Some(_) => ScheduleStatus::Running,
        }
    }

    /// Rebase this context so that `origin` becomes the starting point.
    ///
    /// Used when a schedule starts partway through another schedule's run.
    pub(crate) fn since(&self, origin: &ScheduleContext) -> Self {
        Self {
            iteration: self.iteration.saturating_sub(origin.iteration),
            last_result: if self.iteration > origin.iteration {
                self.last_result
            } else {
                None
            },
            cumulative_applied_delay: self
                .cumulative_applied_delay
                .saturating_sub(origin.cumulative_applied_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_context() {
        let ctx = ScheduleContext::initial();
        assert_eq!(ctx.iterations(), 0);
        assert_eq!(ctx.last_result(), None);
        assert_eq!(ctx.cumulative_applied_delay(), PositiveDuration::ZERO);
        assert!(ctx.has_not_started());
        assert_eq!(ctx.status(), ScheduleStatus::NotStarted);
        assert_eq!(ctx, ScheduleContext::default());
    }

    #[test]
    fn test_next_accumulates_delay() {
        let ctx = ScheduleContext::initial()
            .next(ScheduleResult::delay_for(PositiveDuration::from_millis(10)))
            .next(ScheduleResult::RunAgain)
            .next(ScheduleResult::delay_for(PositiveDuration::from_millis(5)));

        assert_eq!(ctx.iterations(), 3);
        assert_eq!(ctx.cumulative_applied_delay(), PositiveDuration::from_millis(15));
        assert_eq!(ctx.last_delay(), Some(PositiveDuration::from_millis(5)));
        assert!(!ctx.has_not_started());
        assert_eq!(ctx.status(), ScheduleStatus::Running);
    }

    #[test]
    fn test_complete_adds_no_delay() {
        let ctx = ScheduleContext::initial()
            .next(ScheduleResult::delay_for(PositiveDuration::from_millis(10)))
            .next(ScheduleResult::Complete);

        assert_eq!(ctx.cumulative_applied_delay(), PositiveDuration::from_millis(10));
        assert_eq!(ctx.last_delay(), None);
        assert_eq!(ctx.status(), ScheduleStatus::Completed);
    }

    #[test]
    fn test_since_rebases() {
        let origin = ScheduleContext::initial()
            .next(ScheduleResult::delay_for(PositiveDuration::from_millis(10)))
            .next(ScheduleResult::delay_for(PositiveDuration::from_millis(10)));

        assert!(origin.since(&origin).has_not_started());

        let later = origin.next(ScheduleResult::delay_for(PositiveDuration::from_millis(3)));
        let rebased = later.since(&origin);
        assert_eq!(rebased.iterations(), 1);
        assert_eq!(rebased.cumulative_applied_delay(), PositiveDuration::from_millis(3));
    }
}
