//! Seedable randomness for jitter and decorrelated backoff.
//!
//! A [`RandomSource`] is an explicit object passed to the schedules that need
//! it, rather than a hidden global. Tests build one with a fixed seed and get
//! reproducible delays; production code uses [`RandomSource::shared`] or a
//! freshly seeded source from OS entropy.

use std::sync::{Arc, Mutex, OnceLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::duration::PositiveDuration;

/// A uniform random number source.
///
/// Generation is guarded by a single mutex around the generator state, so a
/// source can be shared between threads and schedules. Independent sources
/// never contend with each other.
///
/// # Examples
///
/// ```rust
/// use tidewater::RandomSource;
///
/// let a = RandomSource::seeded(42);
/// let b = RandomSource::seeded(42);
/// assert_eq!(a.uniform(0.0, 10.0), b.uniform(0.0, 10.0));
///
/// // Degenerate ranges return the bound without drawing
/// assert_eq!(a.uniform(3.0, 3.0), 3.0);
/// ```
#[derive(Debug)]
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

static SHARED: OnceLock<Arc<RandomSource>> = OnceLock::new();

impl RandomSource {
    /// A source seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// A deterministic source. The same seed always yields the same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The process-wide default source, created on first use.
    pub fn shared() -> Arc<RandomSource> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(RandomSource::from_entropy())))
    }

    /// A uniform value in `[0, 1)`.
    pub fn next_f64(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random::<f64>()
    }

    /// A uniform value in `[min, max)`.
    ///
    /// Returns `min` without consuming randomness when `min == max`. Reversed
    /// bounds are swapped.
    pub fn uniform(&self, min: f64, max: f64) -> f64 {
        if min == max {
            return min;
        }
        let (low, high) = if min < max { (min, max) } else { (max, min) };
        low + (high - low) * self.next_f64()
    }

    /// A uniform duration in `[min, max)`.
    pub fn uniform_duration(
        &self,
        min: PositiveDuration,
        max: PositiveDuration,
    ) -> PositiveDuration {
        if min == max {
            return min;
        }
        PositiveDuration::from_secs_f64(
            self.uniform(min.as_duration().as_secs_f64(), max.as_duration().as_secs_f64()),
        )
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sources_agree() {
        let a = RandomSource::seeded(1234);
        let b = RandomSource::seeded(1234);
        let xs: Vec<f64> = (0..16).map(|_| a.next_f64()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.next_f64()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let random = RandomSource::seeded(9);
        for _ in 0..1000 {
            let x = random.uniform(5.0, 8.0);
            assert!((5.0..8.0).contains(&x), "{} out of range", x);
        }
    }

    #[test]
    fn test_equal_bounds_do_not_consume() {
        let a = RandomSource::seeded(77);
        let b = RandomSource::seeded(77);
        assert_eq!(a.uniform(2.0, 2.0), 2.0);
        assert_eq!(a.next_f64(), b.next_f64());
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let random = RandomSource::seeded(3);
        let x = random.uniform(10.0, 1.0);
        assert!((1.0..10.0).contains(&x));
    }

    #[test]
    fn test_uniform_duration() {
        let random = RandomSource::seeded(5);
        let min = PositiveDuration::from_millis(10);
        let max = PositiveDuration::from_millis(20);
        for _ in 0..100 {
            let d = random.uniform_duration(min, max);
            assert!(d >= min && d < max);
        }
        assert_eq!(random.uniform_duration(min, min), min);
    }

    #[test]
    fn test_shared_is_a_single_instance() {
        let a = RandomSource::shared();
        let b = RandomSource::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_use() {
        let random = Arc::new(RandomSource::seeded(11));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let random = Arc::clone(&random);
                std::thread::spawn(move || (0..100).map(|_| random.next_f64()).sum::<f64>())
            })
            .collect();
        for handle in handles {
            let total = handle.join().unwrap();
            assert!((0.0..100.0).contains(&total));
        }
    }
}
