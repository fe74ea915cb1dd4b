//! Schedule combinators.
//!
//! Each combinator is a small struct wrapping one or two schedules, built by
//! the methods on [`ScheduleExt`](crate::ScheduleExt). Combinators are
//! zero-cost: composing schedules builds nested types, and nothing is boxed
//! until [`ScheduleExt::boxed`](crate::ScheduleExt::boxed) is called.

mod intersect;
mod jitter;
mod max_cumulative_delay;
mod max_delay;
mod no_delay_on_first_retry;
mod recur_while;
mod then;
mod union;

pub use intersect::Intersect;
pub use jitter::Jitter;
pub use max_cumulative_delay::MaxCumulativeDelay;
pub use max_delay::MaxDelay;
pub use no_delay_on_first_retry::NoDelayOnFirstRetry;
pub use recur_while::RecurWhile;
pub use then::{Then, ThenState};
pub use union::Union;
