//! Non-negative durations with saturating arithmetic.
//!
//! [`PositiveDuration`] is the unit of every delay a schedule produces. It
//! wraps [`std::time::Duration`], which is already unsigned, and adds
//! constructors that clamp negative or non-finite floating inputs to zero
//! instead of panicking, plus arithmetic that saturates rather than overflows.
//!
//! # Examples
//!
//! ```rust
//! use tidewater::PositiveDuration;
//!
//! let base = PositiveDuration::from_millis(100);
//! assert_eq!(base * 2.5, PositiveDuration::from_millis(250));
//! assert_eq!(base + base, PositiveDuration::from_millis(200));
//!
//! // Negative inputs clamp to zero
//! assert_eq!(PositiveDuration::from_millis_f64(-5.0), PositiveDuration::ZERO);
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul};
use std::time::Duration;

/// A time quantity that is always greater than or equal to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    /// The zero duration.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// The largest representable duration.
    pub const MAX: Self = Self(Duration::MAX);

    /// Wrap a standard duration.
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Create a duration from whole milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Create a duration from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Create a duration from fractional milliseconds.
    ///
    /// Negative and NaN inputs clamp to zero; values too large to represent
    /// saturate to [`PositiveDuration::MAX`].
    pub fn from_millis_f64(millis: f64) -> Self {
        Self::from_secs_f64(millis / 1000.0)
    }

    /// Create a duration from fractional seconds, clamping like
    /// [`PositiveDuration::from_millis_f64`].
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_nan() || secs <= 0.0 {
            return Self::ZERO;
        }
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .unwrap_or(Self::MAX)
    }

    /// The wrapped standard duration.
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Fractional milliseconds.
    pub fn as_millis_f64(self) -> f64 {
        self.0.as_secs_f64() * 1000.0
    }

    /// Whole milliseconds, saturating at `u64::MAX`.
    pub fn as_millis(self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns true if this duration is zero.
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// The smaller of two durations.
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    /// The larger of two durations.
    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }

    /// Saturating addition.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction; never goes below zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Scale by a floating factor. Negative or NaN factors give zero,
    /// overflow saturates.
    pub fn mul_f64(self, factor: f64) -> Self {
        if factor.is_nan() || factor <= 0.0 {
            return Self::ZERO;
        }
        Self::from_secs_f64(self.0.as_secs_f64() * factor)
    }
}

impl Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for PositiveDuration {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Mul<f64> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.mul_f64(rhs)
    }
}

impl From<Duration> for PositiveDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<PositiveDuration> for Duration {
    fn from(duration: PositiveDuration) -> Self {
        duration.0
    }
}

impl fmt::Display for PositiveDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
