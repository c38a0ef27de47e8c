//! # Jitter for dispatcher backoff sleeps.
//!
//! Many dispatch tasks backing off from the same saturated endpoint would
//! otherwise wake up together. [`JitterPolicy`] spreads those wake-ups.
//!
//! - [`JitterPolicy::None`]: exact configured wait
//! - [`JitterPolicy::Full`]: random wait in `[0, wait]`
//! - [`JitterPolicy::Equal`]: `wait/2 + random[0, wait/2]`

use std::time::Duration;

use rand::Rng;

/// Randomization applied to rejection waits and round retry intervals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the configured wait as is.
    #[default]
    None,
    /// Uniform in `[0, wait]`.
    Full,
    /// Keeps at least half of the wait.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to a backoff wait.
    pub fn apply(&self, wait: Duration) -> Duration {
        let ms = wait.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return wait;
        }
        match self {
            JitterPolicy::None => wait,
            JitterPolicy::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + extra)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_exact() {
        let d = Duration::from_millis(123);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn full_and_equal_bounds() {
        let d = Duration::from_millis(1000);
        for _ in 0..50 {
            assert!(JitterPolicy::Full.apply(d) <= d);
            let eq = JitterPolicy::Equal.apply(d);
            assert!(eq >= Duration::from_millis(500) && eq <= d);
        }
    }

    #[test]
    fn zero_wait_stays_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }
}
