//! # Simulated work delay.
//!
//! [`DelayPolicy`] draws a random duration from a half-open range. Workers sleep
//! for one draw per item to make the buffer's blocking behaviour visible.
//!
//! - `min == max` → constant delay
//! - `min > max` → bounds are swapped
//! - `max == 0` → no delay

use rand::Rng;
use std::time::Duration;

/// Uniform random delay in `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayPolicy {
    /// Inclusive lower bound.
    pub min: Duration,
    /// Exclusive upper bound.
    pub max: Duration,
}

impl Default for DelayPolicy {
    /// Returns `[800ms, 2000ms)`.
    fn default() -> Self {
        Self {
            min: Duration::from_millis(800),
            max: Duration::from_millis(2000),
        }
    }
}

impl DelayPolicy {
    /// Creates a policy over `[min, max)`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Constant delay of exactly `d`.
    pub fn constant(d: Duration) -> Self {
        Self { min: d, max: d }
    }

    /// Draws the next delay.
    pub fn next(&self) -> Duration {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let lo_ms = lo.as_millis() as u64;
        let hi_ms = hi.as_millis() as u64;
        if lo_ms >= hi_ms {
            return lo;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(lo_ms..hi_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range() {
        let policy = DelayPolicy::default();
        for _ in 0..200 {
            let d = policy.next();
            assert!(d >= Duration::from_millis(800), "{d:?} below floor");
            assert!(d < Duration::from_millis(2000), "{d:?} at or above ceiling");
        }
    }

    #[test]
    fn test_constant() {
        let policy = DelayPolicy::constant(Duration::from_millis(5));
        for _ in 0..10 {
            assert_eq!(policy.next(), Duration::from_millis(5));
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let policy = DelayPolicy::new(Duration::from_millis(50), Duration::from_millis(10));
        for _ in 0..100 {
            let d = policy.next();
            assert!(d >= Duration::from_millis(10) && d < Duration::from_millis(50));
        }
    }

    #[test]
    fn test_zero() {
        let policy = DelayPolicy::constant(Duration::ZERO);
        assert_eq!(policy.next(), Duration::ZERO);
    }
}
