//! Declarative retry configuration.
//!
//! [`RetryConfig`] describes a schedule as plain data, so it can live in a
//! configuration file and be turned into a [`BoxedSchedule`] at startup.
//! With the `serde` feature it deserializes from any serde format:
//!
//! ```rust
//! # #[cfg(feature = "serde")]
//! # {
//! use tidewater::config::{Backoff, RetryConfig};
//!
//! let json = r#"{
//!     "backoff": { "kind": "exponential", "seed_ms": 100, "factor": 2.0 },
//!     "max_retries": 5,
//!     "max_delay_ms": 2000
//! }"#;
//! let config: RetryConfig = serde_json::from_str(json).unwrap();
//! assert_eq!(config.backoff, Backoff::Exponential { seed_ms: 100, factor: 2.0 });
//!
//! let schedule = config.build().unwrap();
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::duration::PositiveDuration;
use crate::random::RandomSource;
use crate::schedule::{
    aws_decorrelated, exponential, fibonacci, forever, from_durations, linear, polly_decorrelated,
    recurs, spaced, BoxedSchedule, ScheduleExt,
};

/// The base delay pattern of a [`RetryConfig`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Backoff {
    /// The same delay every time.
    Spaced {
        /// Delay between runs.
        delay_ms: u64,
    },
    /// Delays of `seed`, `seed * (1 + factor)`, `seed * (1 + 2 * factor)`, ...
    Linear {
        /// First delay.
        seed_ms: u64,
        /// Growth per run, relative to `seed_ms`. Defaults to 1.
        #[cfg_attr(feature = "serde", serde(default = "default_linear_factor"))]
        factor: f64,
    },
    /// Delays of `seed * factor^n`.
    Exponential {
        /// First delay.
        seed_ms: u64,
        /// Multiplier per run. Defaults to 2.
        #[cfg_attr(feature = "serde", serde(default = "default_exponential_factor"))]
        factor: f64,
    },
    /// Delays following the Fibonacci sequence.
    Fibonacci {
        /// First delay.
        seed_ms: u64,
    },
    /// A literal list of delays. Completes after the last one.
    Durations {
        /// The delays, in order.
        delays_ms: Vec<u64>,
    },
    /// AWS-style decorrelated jitter.
    AwsDecorrelated {
        /// Smallest delay.
        min_ms: u64,
        /// Largest delay.
        max_ms: u64,
    },
    /// Polly-style decorrelated jitter.
    PollyDecorrelated {
        /// Target median of the first delay.
        median_first_ms: u64,
    },
    /// No delay at all.
    Forever,
}

#[cfg(feature = "serde")]
fn default_linear_factor() -> f64 {
    1.0
}

#[cfg(feature = "serde")]
fn default_exponential_factor() -> f64 {
    2.0
}

/// Random spread added to every delay.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum JitterConfig {
    /// Add a uniform offset in `[min_ms, max_ms)`.
    Between {
        /// Smallest offset.
        min_ms: u64,
        /// Largest offset (exclusive).
        max_ms: u64,
    },
    /// Add a uniform offset in `[0, delay * factor)`.
    Factor {
        /// Fraction of the delay.
        factor: f64,
    },
}

/// A schedule described as data.
///
/// At least one bound must be set: `max_retries`, `max_cumulative_delay_ms`,
/// or a finite [`Backoff::Durations`] list. Unbounded retries are almost
/// always a bug, so [`validate`](Self::validate) rejects them.
///
/// # Examples
///
/// ```rust
/// use tidewater::config::{Backoff, RetryConfig};
/// use tidewater::prelude::*;
///
/// let schedule = RetryConfig::new(Backoff::Exponential { seed_ms: 100, factor: 2.0 })
///     .with_max_retries(4)
///     .with_max_delay_ms(500)
///     .build()
///     .unwrap();
///
/// let delays: Vec<u64> = schedule.delays().map(|d| d.as_millis()).collect();
/// assert_eq!(delays, vec![100, 200, 400, 500]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryConfig {
    /// Base delay pattern.
    pub backoff: Backoff,
    /// Maximum number of runs after the first.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max_retries: Option<u32>,
    /// Cap on each individual delay.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max_delay_ms: Option<u64>,
    /// Cap on the total delay across the run.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max_cumulative_delay_ms: Option<u64>,
    /// Random spread added to every delay, applied before `max_delay_ms`.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub jitter: Option<JitterConfig>,
    /// Run the first retry immediately.
    #[cfg_attr(feature = "serde", serde(default))]
    pub no_delay_on_first_retry: bool,
    /// Seed for jitter and decorrelated backoff. Uses the shared entropy
    /// source when absent.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub seed: Option<u64>,
}

/// A [`RetryConfig`] that cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No bound is set, so the schedule would never complete.
    Unbounded,
    /// A factor is negative, zero where that is meaningless, or not finite.
    InvalidFactor {
        /// The offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A `durations` backoff with no delays.
    EmptyDurations,
    /// A jitter range whose minimum exceeds its maximum.
    InvalidJitterRange {
        /// Smallest offset.
        min_ms: u64,
        /// Largest offset.
        max_ms: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(
                f,
                "retry config is unbounded: set max_retries, max_cumulative_delay_ms or a durations backoff"
            ),
            Self::InvalidFactor { field, value } => {
                write!(f, "invalid {}: {}", field, value)
            }
            Self::EmptyDurations => write!(f, "durations backoff has no delays"),
            Self::InvalidJitterRange { min_ms, max_ms } => {
                write!(f, "jitter min_ms {} exceeds max_ms {}", min_ms, max_ms)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn ms(millis: u64) -> PositiveDuration {
    PositiveDuration::from_millis(millis)
}

fn check_factor(field: &'static str, value: f64, allow_zero: bool) -> Result<(), ConfigError> {
    let in_range = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if value.is_finite() && in_range {
        Ok(())
    } else {
        Err(ConfigError::InvalidFactor { field, value })
    }
}

impl RetryConfig {
    /// A configuration with no bounds or modifiers.
    pub fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            max_retries: None,
            max_delay_ms: None,
            max_cumulative_delay_ms: None,
            jitter: None,
            no_delay_on_first_retry: false,
            seed: None,
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Cap each delay.
    pub fn with_max_delay_ms(mut self, cap: u64) -> Self {
        self.max_delay_ms = Some(cap);
        self
    }

    /// Cap the total delay.
    pub fn with_max_cumulative_delay_ms(mut self, cap: u64) -> Self {
        self.max_cumulative_delay_ms = Some(cap);
        self
    }

    /// Add random spread to each delay.
    pub fn with_jitter(mut self, jitter: JitterConfig) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Run the first retry immediately.
    pub fn with_no_delay_on_first_retry(mut self) -> Self {
        self.no_delay_on_first_retry = true;
        self
    }

    /// Use a fixed random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the configuration without building it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.backoff {
            Backoff::Linear { factor, .. } => check_factor("linear factor", *factor, true)?,
            Backoff::Exponential { factor, .. } => {
                check_factor("exponential factor", *factor, false)?
            }
            Backoff::Durations { delays_ms } if delays_ms.is_empty() => {
                return Err(ConfigError::EmptyDurations)
            }
            _ => {}
        }

        match self.jitter {
            Some(JitterConfig::Between { min_ms, max_ms }) if min_ms > max_ms => {
                return Err(ConfigError::InvalidJitterRange { min_ms, max_ms });
            }
            Some(JitterConfig::Factor { factor }) => check_factor("jitter factor", factor, true)?,
            _ => {}
        }

        let bounded = self.max_retries.is_some()
            || self.max_cumulative_delay_ms.is_some()
            || matches!(self.backoff, Backoff::Durations { .. });
        if bounded {
            Ok(())
        } else {
            Err(ConfigError::Unbounded)
        }
    }

    /// Validate and build the described schedule.
    ///
    /// Modifiers apply in a fixed order: jitter, then the per-delay cap, then
    /// the immediate first retry, then the retry count and total delay
    /// bounds.
    pub fn build(&self) -> Result<BoxedSchedule, ConfigError> {
        self.validate()?;

        let random = match self.seed {
            Some(seed) => Arc::new(RandomSource::seeded(seed)),
            None => RandomSource::shared(),
        };

        let mut schedule = match &self.backoff {
            Backoff::Spaced { delay_ms } => spaced(ms(*delay_ms)).boxed(),
            Backoff::Linear { seed_ms, factor } => linear(ms(*seed_ms), *factor).boxed(),
            Backoff::Exponential { seed_ms, factor } => exponential(ms(*seed_ms), *factor).boxed(),
            Backoff::Fibonacci { seed_ms } => fibonacci(ms(*seed_ms)).boxed(),
            Backoff::Durations { delays_ms } => {
                from_durations(delays_ms.iter().copied().map(ms)).boxed()
            }
            Backoff::AwsDecorrelated { min_ms, max_ms } => {
                aws_decorrelated(ms(*min_ms), ms(*max_ms), Arc::clone(&random)).boxed()
            }
            Backoff::PollyDecorrelated { median_first_ms } => {
                polly_decorrelated(ms(*median_first_ms), Arc::clone(&random)).boxed()
            }
            Backoff::Forever => forever().boxed(),
        };

        schedule = match self.jitter {
            Some(JitterConfig::Between { min_ms, max_ms }) => schedule
                .jitter(ms(min_ms), ms(max_ms), Arc::clone(&random))
                .boxed(),
            Some(JitterConfig::Factor { factor }) => {
                schedule.jitter_factor(factor, Arc::clone(&random)).boxed()
            }
            None => schedule,
        };
        if let Some(cap) = self.max_delay_ms {
            schedule = schedule.max_delay(ms(cap)).boxed();
        }
        if self.no_delay_on_first_retry {
            schedule = schedule.no_delay_on_first_retry().boxed();
        }
        if let Some(retries) = self.max_retries {
            schedule = schedule.union(recurs(retries)).boxed();
        }
        if let Some(cap) = self.max_cumulative_delay_ms {
            schedule = schedule.max_cumulative_delay(ms(cap)).boxed();
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleResult;

    fn millis(schedule: BoxedSchedule) -> Vec<u64> {
        schedule.delays().map(|d| d.as_millis()).collect()
    }

    #[test]
    fn test_unbounded_is_rejected() {
        let config = RetryConfig::new(Backoff::Spaced { delay_ms: 10 });
        assert_eq!(config.validate(), Err(ConfigError::Unbounded));
        assert!(config.build().is_err());
    }

    #[test]
    fn test_durations_are_their_own_bound() {
        let config = RetryConfig::new(Backoff::Durations {
            delays_ms: vec![5, 10],
        });
        assert_eq!(millis(config.build().unwrap()), vec![5, 10]);
    }

    #[test]
    fn test_empty_durations_rejected() {
        let config = RetryConfig::new(Backoff::Durations { delays_ms: vec![] });
        assert_eq!(config.validate(), Err(ConfigError::EmptyDurations));
    }

    #[test]
    fn test_invalid_factors_rejected() {
        let config = RetryConfig::new(Backoff::Exponential {
            seed_ms: 1,
            factor: 0.0,
        })
        .with_max_retries(1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFactor {
                field: "exponential factor",
                ..
            })
        ));

        let config = RetryConfig::new(Backoff::Linear {
            seed_ms: 1,
            factor: f64::NAN,
        })
        .with_max_retries(1);
        assert!(config.validate().is_err());

        let config = RetryConfig::new(Backoff::Forever)
            .with_max_retries(1)
            .with_jitter(JitterConfig::Factor { factor: -0.5 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reversed_jitter_range_rejected() {
        let config = RetryConfig::new(Backoff::Forever)
            .with_max_retries(1)
            .with_jitter(JitterConfig::Between {
                min_ms: 10,
                max_ms: 5,
            });
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidJitterRange {
                min_ms: 10,
                max_ms: 5
            })
        );
    }

    #[test]
    fn test_build_matches_hand_built_schedule() {
        let config = RetryConfig::new(Backoff::Fibonacci { seed_ms: 10 })
            .with_max_retries(6)
            .with_max_delay_ms(45)
            .with_no_delay_on_first_retry();

        let expected: Vec<u64> = fibonacci(ms(10))
            .max_delay(ms(45))
            .no_delay_on_first_retry()
            .union(recurs(6))
            .delays()
            .map(|d| d.as_millis())
            .collect();

        assert_eq!(millis(config.build().unwrap()), expected);
        assert_eq!(expected, vec![0, 10, 20, 30, 45, 45]);
    }

    #[test]
    fn test_cumulative_bound() {
        let config =
            RetryConfig::new(Backoff::Spaced { delay_ms: 30 }).with_max_cumulative_delay_ms(100);
        assert_eq!(millis(config.build().unwrap()), vec![30, 30, 30]);
    }

    #[test]
    fn test_seeded_config_is_reproducible() {
        let config = RetryConfig::new(Backoff::AwsDecorrelated {
            min_ms: 10,
            max_ms: 1000,
        })
        .with_max_retries(10)
        .with_jitter(JitterConfig::Factor { factor: 0.1 })
        .with_seed(42);

        let a = millis(config.build().unwrap());
        let b = millis(config.build().unwrap());
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_zero_retries_completes_immediately() {
        let schedule = RetryConfig::new(Backoff::Forever)
            .with_max_retries(0)
            .build()
            .unwrap();
        assert_eq!(schedule.decisions().next(), Some(ScheduleResult::Complete));
    }

    #[test]
    fn test_error_display() {
        assert!(ConfigError::Unbounded.to_string().contains("unbounded"));
        assert_eq!(
            ConfigError::InvalidFactor {
                field: "jitter factor",
                value: -1.0
            }
            .to_string(),
            "invalid jitter factor: -1"
        );
    }

    #[cfg(feature = "serde")]
    mod serde_tests {
        use super::*;

        #[test]
        fn test_defaults_when_fields_missing() {
            let config: RetryConfig = serde_json::from_str(
                r#"{ "backoff": { "kind": "exponential", "seed_ms": 50 }, "max_retries": 3 }"#,
            )
            .unwrap();
            assert_eq!(
                config,
                RetryConfig::new(Backoff::Exponential {
                    seed_ms: 50,
                    factor: 2.0
                })
                .with_max_retries(3)
            );
        }

        #[test]
        fn test_jitter_variants_deserialize() {
            let between: JitterConfig =
                serde_json::from_str(r#"{ "min_ms": 1, "max_ms": 9 }"#).unwrap();
            assert_eq!(between, JitterConfig::Between { min_ms: 1, max_ms: 9 });

            let factor: JitterConfig = serde_json::from_str(r#"{ "factor": 0.25 }"#).unwrap();
            assert_eq!(factor, JitterConfig::Factor { factor: 0.25 });
        }

        #[test]
        fn test_unit_backoff_kind() {
            let backoff: Backoff = serde_json::from_str(r#"{ "kind": "forever" }"#).unwrap();
            assert_eq!(backoff, Backoff::Forever);
        }

        #[test]
        fn test_unknown_kind_rejected() {
            let result = serde_json::from_str::<Backoff>(r#"{ "kind": "quadratic" }"#);
            assert!(result.is_err());
        }
    }
}
