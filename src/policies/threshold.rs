//! # Error thresholds for a worker pool.
//!
//! Negative values are the "disabled" sentinel. A threshold `k ≥ 0` is
//! breached once the matching counter exceeds `k`, so `successive = 2` shuts a
//! pool down on the third consecutive failure.

/// Failure ceilings for one endpoint's worker pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorThresholds {
    /// Consecutive failures tolerated (`< 0` = disabled).
    pub successive: i64,
    /// Cumulative failures tolerated (`< 0` = disabled).
    pub total: i64,
}

impl Default for ErrorThresholds {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ErrorThresholds {
    /// Both thresholds disabled.
    pub const fn disabled() -> Self {
        Self {
            successive: -1,
            total: -1,
        }
    }

    /// Returns the successive-failure threshold as an `Option`.
    ///
    /// - `None` → disabled
    /// - `Some(k)` → breached when the counter exceeds `k`
    #[inline]
    pub fn successive_limit(&self) -> Option<u64> {
        u64::try_from(self.successive).ok()
    }

    /// Returns the total-failure threshold as an `Option`.
    #[inline]
    pub fn total_limit(&self) -> Option<u64> {
        u64::try_from(self.total).ok()
    }

    /// Whether the given counters breach an enabled threshold.
    pub fn is_breached(&self, successive: u64, total: u64) -> bool {
        self.successive_limit().is_some_and(|k| successive > k)
            || self.total_limit().is_some_and(|k| total > k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_never_breaches() {
        let t = ErrorThresholds::disabled();
        assert!(!t.is_breached(u64::MAX, u64::MAX));
    }

    #[test]
    fn breach_is_strictly_greater() {
        let t = ErrorThresholds {
            successive: 2,
            total: -1,
        };
        assert!(!t.is_breached(2, 100));
        assert!(t.is_breached(3, 3));

        let zero = ErrorThresholds {
            successive: -1,
            total: 0,
        };
        assert!(zero.is_breached(0, 1));
    }
}
