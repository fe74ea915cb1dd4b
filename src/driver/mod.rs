//! Drivers that run effects according to a schedule.
//!
//! Schedules only decide. A driver invokes the effect, feeds each outcome to
//! the schedule, sleeps for the decided delay and stops when the schedule
//! completes, when the operation's own rule says so, or on cancellation:
//!
//! ```text
//! Start -> Invoke -> Decide -> (Sleep -> Invoke -> Decide)* -> Success | Failed | Cancelled
//! ```
//!
//! | operation | continues while | returns |
//! |---|---|---|
//! | `repeat` | the effect succeeds | last success or first failure |
//! | `repeat_while(p)` / `repeat_until(p)` | success and `p` holds / fails | last success or first failure |
//! | `retry` | the effect fails | first success or last failure |
//! | `retry_while(p)` / `retry_until(p)` | failure and `p` holds / fails | first success or last failure |
//! | `fold(init, f)` | the effect succeeds | accumulator or first failure |
//! | `fold_while` / `fold_until` | success and `p` holds / fails | accumulator or first failure |
//!
//! In every case the schedule gets the final say: a `Complete` decision ends
//! the run with the latest outcome.
//!
//! [`Runner`] blocks the current thread; [`AsyncRunner`] awaits. The free
//! functions in this module use a default blocking [`Runner`].
//!
//! # Cancellation
//!
//! Each runner carries a [`CancellationToken`]. The token is checked before
//! every invocation and interrupts a sleep in progress. A cancelled run
//! returns [`RunError::Cancelled`], never an effect failure.
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! token.cancel();
//!
//! let mut calls = 0;
//! let result = Runner::new()
//!     .with_cancellation(token)
//!     .repeat(&forever(), || {
//!         calls += 1;
//!         Ok::<_, ()>(calls)
//!     });
//!
//! assert_eq!(result, Err(RunError::Cancelled));
//! assert_eq!(calls, 0);
//! ```

mod blocking;
mod cycle;
mod error;
mod future;
mod observer;
mod sleep;

pub use blocking::Runner;
pub use error::{Cancelled, RunError};
pub use future::AsyncRunner;
pub use observer::{NoObserver, Observer, ScheduleEvent};
#[cfg(feature = "async")]
pub use sleep::TokioSleeper;
pub use sleep::{AsyncSleeper, Sleeper, ThreadSleeper};

pub use tokio_util::sync::CancellationToken;

use crate::schedule::ResultSchedule;

/// [`Runner::repeat`] on a default runner.
///
/// ```rust
/// use tidewater::prelude::*;
///
/// let mut count = 0;
/// let result = repeat(&recurs(4), || {
///     count += 1;
///     Ok::<_, String>(count)
/// });
/// assert_eq!(result, Ok(5));
/// ```
pub fn repeat<S, A, E, F>(schedule: &S, effect: F) -> Result<A, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
{
    Runner::new().repeat(schedule, effect)
}

/// [`Runner::repeat_while`] on a default runner.
pub fn repeat_while<S, A, E, F, P>(schedule: &S, effect: F, predicate: P) -> Result<A, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    P: Fn(&A) -> bool,
{
    Runner::new().repeat_while(schedule, effect, predicate)
}

/// [`Runner::repeat_until`] on a default runner.
pub fn repeat_until<S, A, E, F, P>(schedule: &S, effect: F, predicate: P) -> Result<A, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    P: Fn(&A) -> bool,
{
    Runner::new().repeat_until(schedule, effect, predicate)
}

/// [`Runner::retry`] on a default runner.
pub fn retry<S, A, E, F>(schedule: &S, effect: F) -> Result<A, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
{
    Runner::new().retry(schedule, effect)
}

/// [`Runner::retry_while`] on a default runner.
pub fn retry_while<S, A, E, F, P>(schedule: &S, effect: F, predicate: P) -> Result<A, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    P: Fn(&E) -> bool,
{
    Runner::new().retry_while(schedule, effect, predicate)
}

/// [`Runner::retry_until`] on a default runner.
pub fn retry_until<S, A, E, F, P>(schedule: &S, effect: F, predicate: P) -> Result<A, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    P: Fn(&E) -> bool,
{
    Runner::new().retry_until(schedule, effect, predicate)
}

/// [`Runner::fold`] on a default runner.
pub fn fold<S, A, E, T, F, G>(schedule: &S, init: T, fold: G, effect: F) -> Result<T, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    G: FnMut(T, A) -> T,
{
    Runner::new().fold(schedule, init, fold, effect)
}

/// [`Runner::fold_while`] on a default runner.
pub fn fold_while<S, A, E, T, F, G, P>(
    schedule: &S,
    init: T,
    fold: G,
    effect: F,
    predicate: P,
) -> Result<T, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    G: FnMut(T, A) -> T,
    P: Fn(&A) -> bool,
{
    Runner::new().fold_while(schedule, init, fold, effect, predicate)
}

/// [`Runner::fold_until`] on a default runner.
pub fn fold_until<S, A, E, T, F, G, P>(
    schedule: &S,
    init: T,
    fold: G,
    effect: F,
    predicate: P,
) -> Result<T, RunError<E>>
where
    S: ResultSchedule<A, E>,
    F: FnMut() -> Result<A, E>,
    G: FnMut(T, A) -> T,
    P: Fn(&A) -> bool,
{
    Runner::new().fold_until(schedule, init, fold, effect, predicate)
}
