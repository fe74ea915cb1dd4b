//! Decorrelated jitter backoff.
//!
//! Plain exponential backoff with jitter still lets concurrent clients
//! drift into lockstep. Decorrelated schedules derive each delay from the
//! previous one, so clients that start together spread apart quickly.

use std::sync::Arc;

use crate::duration::PositiveDuration;
use crate::random::RandomSource;
use crate::schedule::{Schedule, ScheduleContext, ScheduleResult};

/// AWS-style decorrelated jitter. See [`aws_decorrelated`].
#[derive(Debug, Clone)]
pub struct AwsDecorrelated {
    min: PositiveDuration,
    max: PositiveDuration,
    random: Arc<RandomSource>,
}

/// Decorrelated jitter as described in the AWS architecture blog:
/// `next = uniform(min, min(max, previous * 3))`, starting from `min`.
///
/// Delays always lie in `[min, max]`. Never completes on its own.
///
/// ```rust
/// use std::sync::Arc;
/// use tidewater::prelude::*;
///
/// let min = PositiveDuration::from_millis(10);
/// let max = PositiveDuration::from_secs(1);
/// let schedule = aws_decorrelated(min, max, Arc::new(RandomSource::seeded(1)));
///
/// for delay in schedule.delays().take(50) {
///     assert!(delay >= min && delay <= max);
/// }
/// ```
pub fn aws_decorrelated(
    min: impl Into<PositiveDuration>,
    max: impl Into<PositiveDuration>,
    random: Arc<RandomSource>,
) -> AwsDecorrelated {
    let min = min.into();
    let max = max.into();
    AwsDecorrelated {
        min: min.min(max),
        max: max.max(min),
        random,
    }
}

impl Schedule for AwsDecorrelated {
    /// The previous delay.
    type State = PositiveDuration;

    fn start(&self) -> PositiveDuration {
        self.min
    }

    fn step(
        &self,
        previous: PositiveDuration,
        _context: &ScheduleContext,
    ) -> (ScheduleResult, PositiveDuration) {
        let high = self.max.min(previous * 3.0).max(self.min);
        let delay = self.random.uniform_duration(self.min, high);
        (ScheduleResult::DelayAndRunAgain(delay), delay)
    }
}

/// Polly-style decorrelated jitter. See [`polly_decorrelated`].
#[derive(Debug, Clone)]
pub struct PollyDecorrelated {
    median_first: PositiveDuration,
    random: Arc<RandomSource>,
}

const P_FACTOR: f64 = 4.0;
const RP_SCALING_FACTOR: f64 = 1.0 / 1.4;

/// Decorrelated jitter tuned so the first retry waits `median_first` at the
/// median, with smoothly increasing, well-spread delays after that.
///
/// For iteration `i` the schedule draws `t = i + U[0, 1)`, computes
/// `2^t * tanh(sqrt(4t))`, and waits the increase over the previous value
/// scaled by `median_first / 1.4`. Once `2^t` overflows, every delay is
/// [`PositiveDuration::MAX`]. Never completes on its own.
pub fn polly_decorrelated(
    median_first: impl Into<PositiveDuration>,
    random: Arc<RandomSource>,
) -> PollyDecorrelated {
    PollyDecorrelated {
        median_first: median_first.into(),
        random,
    }
}

impl Schedule for PollyDecorrelated {
    /// The previous formula value.
    type State = f64;

    fn start(&self) -> f64 {
        0.0
    }

    fn step(&self, previous: f64, context: &ScheduleContext) -> (ScheduleResult, f64) {
        let t = f64::from(context.iterations()) + self.random.next_f64();
        let next = t.exp2() * (P_FACTOR * t).sqrt().tanh();
        if !next.is_finite() {
            // 2^t overflowed; the delay has long since saturated
            return (ScheduleResult::DelayAndRunAgain(PositiveDuration::MAX), previous);
        }
        let delay = self.median_first * ((next - previous) * RP_SCALING_FACTOR);
        (ScheduleResult::DelayAndRunAgain(delay), next)
    }
}
