//! The decision a schedule makes after each run.

use std::fmt;

use crate::duration::PositiveDuration;

/// One schedule decision: stop, run again now, or run again after a delay.
///
/// `RunAgain` and `DelayAndRunAgain` both mean "continue"; `RunAgain` is the
/// zero-delay form. A `Complete` decision has no delay at all, so
/// [`ScheduleResult::delay`] returns `None` for it.
///
/// # Combining decisions
///
/// [`union`](ScheduleResult::union) and [`intersect`](ScheduleResult::intersect)
/// both stop as soon as either side stops. They differ in how two continuing
/// decisions are merged:
///
/// | left | right | union | intersect |
/// |------|-------|-------|-----------|
/// | `RunAgain` | `RunAgain` | `RunAgain` | `RunAgain` |
/// | `RunAgain` | `Delay(d)` | `Delay(d)` | `Delay(d)` |
/// | `Delay(a)` | `Delay(b)` | `Delay(min(a, b))` | `Delay(max(a, b))` |
///
/// `RunAgain` places no constraint on the delay, so it is the identity for
/// both operations among continuing decisions.
///
/// # Examples
///
/// ```rust
/// use tidewater::{PositiveDuration, ScheduleResult};
///
/// let fast = ScheduleResult::delay_for(PositiveDuration::from_millis(10));
/// let slow = ScheduleResult::delay_for(PositiveDuration::from_millis(50));
///
/// assert_eq!(fast.union(slow), fast);
/// assert_eq!(fast.intersect(slow), slow);
/// assert!(fast.union(ScheduleResult::Complete).is_complete());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleResult {
    /// The schedule is finished.
    Complete,
    /// Continue immediately.
    RunAgain,
    /// Continue after the given delay.
    DelayAndRunAgain(PositiveDuration),
}

impl ScheduleResult {
    /// A continuing decision with the given delay.
    pub fn delay_for(delay: impl Into<PositiveDuration>) -> Self {
        Self::DelayAndRunAgain(delay.into())
    }

    /// Returns true for `Complete`.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns true for `RunAgain` and `DelayAndRunAgain`.
    pub fn is_continue(&self) -> bool {
        !self.is_complete()
    }

    /// The delay before the next run, or `None` when the schedule is complete.
    ///
    /// `RunAgain` reports a zero delay.
    pub fn delay(&self) -> Option<PositiveDuration> {
        match self {
            Self::Complete => None,
            Self::RunAgain => Some(PositiveDuration::ZERO),
            Self::DelayAndRunAgain(d) => Some(*d),
        }
    }

    /// The delay before the next run, treating `Complete` as zero.
    pub fn delay_or_zero(&self) -> PositiveDuration {
        self.delay().unwrap_or(PositiveDuration::ZERO)
    }

    /// Transform the delay of a continuing decision.
    ///
    /// `RunAgain` is passed a zero delay. `Complete` is returned unchanged.
    pub fn map_delay<F>(self, f: F) -> Self
    where
        F: FnOnce(PositiveDuration) -> PositiveDuration,
    {
        match self {
            Self::Complete => Self::Complete,
            Self::RunAgain => Self::DelayAndRunAgain(f(PositiveDuration::ZERO)),
            Self::DelayAndRunAgain(d) => Self::DelayAndRunAgain(f(d)),
        }
    }

    /// Stop if either side stops, otherwise take the sooner continuation.
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Complete, _) | (_, Self::Complete) => Self::Complete,
            (Self::RunAgain, x) | (x, Self::RunAgain) => x,
            (Self::DelayAndRunAgain(a), Self::DelayAndRunAgain(b)) => {
                Self::DelayAndRunAgain(a.min(b))
            }
        }
    }

    /// Stop if either side stops, otherwise take the later continuation.
    pub fn intersect(self, other: Self) -> Self {
        match (self, other) {
            (Self::Complete, _) | (_, Self::Complete) => Self::Complete,
            (Self::RunAgain, x) | (x, Self::RunAgain) => x,
            (Self::DelayAndRunAgain(a), Self::DelayAndRunAgain(b)) => {
                Self::DelayAndRunAgain(a.max(b))
            }
        }
    }
}

impl fmt::Display for ScheduleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::RunAgain => write!(f, "run again"),
            Self::DelayAndRunAgain(d) => write!(f, "run again after {}", d),
        }
    }
}
