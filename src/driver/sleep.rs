//! Sleep primitives used by the drivers.

use std::future::Future;
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::driver::error::Cancelled;

/// A blocking sleep that can be interrupted.
///
/// Implementations return `Err(Cancelled)` as soon as they observe the
/// token firing, including when it has already fired before the call.
pub trait Sleeper {
    /// Sleep for `delay` unless `cancel` fires first.
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled>;
}

/// A cooperative sleep that can be interrupted.
pub trait AsyncSleeper {
    /// Sleep for `delay` unless `cancel` fires first.
    fn sleep(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), Cancelled>> + Send;
}

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Sleeps the current thread, waking periodically to check for cancellation.
///
/// Cancellation is noticed within one poll interval (10ms by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadSleeper {
    poll_interval: Duration,
}

impl ThreadSleeper {
    /// A sleeper with the default poll interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check for cancellation every `poll_interval`.
    ///
    /// A zero interval is replaced with one millisecond.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
        // None means the deadline is beyond what Instant can represent
        let deadline = Instant::now().checked_add(delay);
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    (deadline - now).min(self.poll_interval)
                }
                None => self.poll_interval,
            };
            thread::sleep(slice);
        }
    }
}

/// Sleeps on the tokio timer, racing the cancellation token.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokioSleeper;

#[cfg(feature = "async")]
impl AsyncSleeper for TokioSleeper {
    fn sleep(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), Cancelled>> + Send {
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Cancelled),
                _ = tokio::time::sleep(delay) => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_sleeper_sleeps() {
        let sleeper = ThreadSleeper::new();
        let start = Instant::now();
        sleeper
            .sleep(Duration::from_millis(20), &CancellationToken::new())
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_thread_sleeper_zero_delay() {
        let sleeper = ThreadSleeper::new();
        assert_eq!(sleeper.sleep(Duration::ZERO, &CancellationToken::new()), Ok(()));
    }

    #[test]
    fn test_thread_sleeper_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let start = Instant::now();
        assert_eq!(
            ThreadSleeper::new().sleep(Duration::from_secs(60), &token),
            Err(Cancelled)
        );
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_thread_sleeper_interrupted() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });

        let start = Instant::now();
        let result = ThreadSleeper::with_poll_interval(Duration::from_millis(5))
            .sleep(Duration::from_secs(60), &token);
        handle.join().unwrap();

        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        let sleeper = ThreadSleeper::with_poll_interval(Duration::ZERO);
        assert_eq!(sleeper.poll_interval, Duration::from_millis(1));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_tokio_sleeper_sleeps() {
        let start = tokio::time::Instant::now();
        TokioSleeper
            .sleep(Duration::from_millis(20), &CancellationToken::new())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_tokio_sleeper_interrupted() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let start = std::time::Instant::now();
        let result = TokioSleeper.sleep(Duration::from_secs(60), &token).await;
        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
