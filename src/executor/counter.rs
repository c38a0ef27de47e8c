//! # Failure counters for one endpoint.
//!
//! Updated concurrently from completing worker tasks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Successive and total failure counters.
#[derive(Debug, Default)]
pub struct ErrorCounter {
    successive: AtomicU64,
    total: AtomicU64,
}

impl ErrorCounter {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure and returns `(successive, total)` after the increment.
    pub fn record_failure(&self) -> (u64, u64) {
        let successive = self.successive.fetch_add(1, Ordering::AcqRel) + 1;
        let total = self.total.fetch_add(1, Ordering::AcqRel) + 1;
        (successive, total)
    }

    /// Records a success: the successive counter drops to zero.
    pub fn record_success(&self) {
        self.successive.store(0, Ordering::Release);
    }

    /// Clears the successive counter only; `total` survives restarts.
    pub fn reset_successive(&self) {
        self.successive.store(0, Ordering::Release);
    }

    /// Current `(successive, total)`.
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.successive.load(Ordering::Acquire),
            self.total.load(Ordering::Acquire),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_successive_only() {
        let c = ErrorCounter::new();
        c.record_failure();
        assert_eq!(c.record_failure(), (2, 2));
        c.record_success();
        assert_eq!(c.snapshot(), (0, 2));
        assert_eq!(c.record_failure(), (1, 3));
    }
}
