//! Error types for driver operations.

use std::fmt;

/// Error returned when a driven run does not end in success.
///
/// A run either fails with the effect's own error, unchanged, or is cancelled
/// through its [`CancellationToken`](tokio_util::sync::CancellationToken).
/// Cancellation is never reported as an effect failure.
///
/// # Examples
///
/// ```rust
/// use tidewater::prelude::*;
///
/// let result = retry(&recurs(2), || Err::<(), _>("connection refused"));
///
/// match result {
///     Err(RunError::Failed(error)) => assert_eq!(error, "connection refused"),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError<E> {
    /// The effect's last actual invocation failed with this error.
    Failed(E),
    /// The run was cancelled before it finished.
    Cancelled,
}

impl<E> RunError<E> {
    /// Returns true if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the effect failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The effect's error, if the run failed.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Cancelled => None,
        }
    }

    /// Borrow the effect's error, if the run failed.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Cancelled => None,
        }
    }

    /// Transform the effect's error, leaving cancellation untouched.
    pub fn map_failure<F, E2>(self, f: F) -> RunError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Failed(e) => RunError::Failed(f(e)),
            Self::Cancelled => RunError::Cancelled,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RunError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "{}", e),
            Self::Cancelled => write!(f, "run cancelled"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RunError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

impl<E> From<Cancelled> for RunError<E> {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// A sleep that was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cancelled")
    }
}

impl std::error::Error for Cancelled {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, PartialEq)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl std::error::Error for Refused {}

    #[test]
    fn test_failed_helpers() {
        let err = RunError::Failed("boom");
        assert!(err.is_failed());
        assert!(!err.is_cancelled());
        assert_eq!(err.failure(), Some(&"boom"));
        assert_eq!(err.into_failure(), Some("boom"));
    }

    #[test]
    fn test_cancelled_helpers() {
        let err: RunError<String> = RunError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_failed());
        assert_eq!(err.failure(), None);
        assert_eq!(err.into_failure(), None);
    }

    #[test]
    fn test_map_failure() {
        let err = RunError::Failed(2).map_failure(|n| n * 10);
        assert_eq!(err, RunError::Failed(20));

        let cancelled: RunError<i32> = RunError::Cancelled;
        assert_eq!(cancelled.map_failure(|n| n * 10), RunError::<i32>::Cancelled);
    }

    #[test]
    fn test_display() {
        assert_eq!(RunError::Failed(Refused).to_string(), "connection refused");
        assert_eq!(RunError::<Refused>::Cancelled.to_string(), "run cancelled");
        assert_eq!(Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_source_forwards_failure() {
        assert!(RunError::Failed(Refused).source().is_some());
        assert!(RunError::<Refused>::Cancelled.source().is_none());
    }

    #[test]
    fn test_from_cancelled() {
        let err: RunError<Refused> = Cancelled.into();
        assert!(err.is_cancelled());
    }
}
