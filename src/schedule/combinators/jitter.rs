//! Random jitter.

use std::sync::Arc;

use crate::duration::PositiveDuration;
use crate::random::RandomSource;
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// Adds a random offset to every continuing decision of the inner schedule.
///
/// Created by [`ScheduleExt::jitter`](crate::ScheduleExt::jitter) and
/// [`ScheduleExt::jitter_factor`](crate::ScheduleExt::jitter_factor).
/// Randomness comes from the injected [`RandomSource`]; two jittered
/// schedules built from sources with the same seed produce the same delays.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tidewater::prelude::*;
///
/// let jittered = |seed| {
///     spaced(PositiveDuration::from_millis(100))
///         .jitter(
///             PositiveDuration::ZERO,
///             PositiveDuration::from_millis(50),
///             Arc::new(RandomSource::seeded(seed)),
///         )
///         .union(recurs(5))
/// };
///
/// let a: Vec<_> = jittered(7).delays().collect();
/// let b: Vec<_> = jittered(7).delays().collect();
/// assert_eq!(a, b);
/// assert!(a.iter().all(|d| d.as_millis() >= 100 && d.as_millis() < 150));
/// ```
#[derive(Debug, Clone)]
pub struct Jitter<S> {
    inner: S,
    spread: Spread,
    random: Arc<RandomSource>,
}

#[derive(Debug, Clone, Copy)]
enum Spread {
    Between {
        min: PositiveDuration,
        max: PositiveDuration,
    },
    Proportional(f64),
}

impl<S> Jitter<S> {
    pub(crate) fn between(
        inner: S,
        min: PositiveDuration,
        max: PositiveDuration,
        random: Arc<RandomSource>,
    ) -> Self {
        Self {
            inner,
            spread: Spread::Between { min, max },
            random,
        }
    }

    pub(crate) fn proportional(inner: S, factor: f64, random: Arc<RandomSource>) -> Self {
        Self {
            inner,
            spread: Spread::Proportional(factor),
            random,
        }
    }

    fn offset(&self, delay: PositiveDuration) -> PositiveDuration {
        match self.spread {
            Spread::Between { min, max } => self.random.uniform_duration(min, max),
            Spread::Proportional(factor) => {
                self.random.uniform_duration(PositiveDuration::ZERO, delay * factor)
            }
        }
    }
}

impl<S: Schedule> Schedule for Jitter<S> {
    type State = S::State;

    fn start(&self) -> Self::State {
        self.inner.start()
    }

    fn step(&self, state: Self::State, context: &ScheduleContext) -> (ScheduleResult, Self::State) {
        let (decision, state) = self.inner.step(state, context);
        (decision.map_delay(|d| d + self.offset(d)), state)
    }
}
