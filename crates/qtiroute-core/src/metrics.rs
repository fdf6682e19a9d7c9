//! Process-wide counters of route activity.
//!
//! The route increments these as steps are appended, routes composed and
//! branches resolved. A [`crate::SessionSpan`] flushes them when it closes, so
//! each session ends with one `route.metrics` event carrying the totals.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

#[derive(Debug)]
pub struct Metrics {
    steps_appended: AtomicU64,
    routes_composed: AtomicU64,
    branches_taken: AtomicU64,
    branches_rejected: AtomicU64,
}

/// Counter values read at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub steps_appended: u64,
    pub routes_composed: u64,
    pub branches_taken: u64,
    pub branches_rejected: u64,
}

impl MetricsSnapshot {
    /// Counts accumulated since `earlier`.
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            steps_appended: self.steps_appended.saturating_sub(earlier.steps_appended),
            routes_composed: self.routes_composed.saturating_sub(earlier.routes_composed),
            branches_taken: self.branches_taken.saturating_sub(earlier.branches_taken),
            branches_rejected: self.branches_rejected.saturating_sub(earlier.branches_rejected),
        }
    }

    /// Share of branch attempts that were refused; `None` before any attempt.
    pub fn rejection_rate(&self) -> Option<f64> {
        let attempts = self.branches_taken + self.branches_rejected;
        (attempts > 0).then(|| self.branches_rejected as f64 / attempts as f64)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            steps_appended: AtomicU64::new(0),
            routes_composed: AtomicU64::new(0),
            branches_taken: AtomicU64::new(0),
            branches_rejected: AtomicU64::new(0),
        }
    }

    pub(crate) fn inc_steps_appended(&self) {
        self.steps_appended.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_routes_composed(&self) {
        self.routes_composed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_branches_taken(&self) {
        self.branches_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_branches_rejected(&self) {
        self.branches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            steps_appended: self.steps_appended.load(Ordering::Relaxed),
            routes_composed: self.routes_composed.load(Ordering::Relaxed),
            branches_taken: self.branches_taken.load(Ordering::Relaxed),
            branches_rejected: self.branches_rejected.load(Ordering::Relaxed),
        }
    }

    /// Log the current totals as one `route.metrics` event.
    pub fn flush(&self) {
        let totals = self.snapshot();
        tracing::info!(
            event = "route.metrics",
            steps_appended = totals.steps_appended,
            routes_composed = totals.routes_composed,
            branches_taken = totals.branches_taken,
            branches_rejected = totals.branches_rejected,
            rejection_rate = totals.rejection_rate().unwrap_or(0.0),
        );
    }

    pub fn reset(&self) {
        self.steps_appended.store(0, Ordering::Relaxed);
        self.routes_composed.store(0, Ordering::Relaxed);
        self.branches_taken.store(0, Ordering::Relaxed);
        self.branches_rejected.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let m = Metrics::new();
        m.inc_steps_appended();
        m.inc_steps_appended();
        m.inc_routes_composed();
        m.inc_branches_taken();
        m.inc_branches_rejected();
        m.inc_branches_rejected();

        let totals = m.snapshot();
        assert_eq!(totals.steps_appended, 2);
        assert_eq!(totals.routes_composed, 1);
        assert_eq!(totals.branches_taken, 1);
        assert_eq!(totals.branches_rejected, 2);
    }

    #[test]
    fn test_since_and_rejection_rate() {
        let m = Metrics::new();
        m.inc_branches_taken();
        let before = m.snapshot();
        assert_eq!(before.rejection_rate(), Some(0.0));

        m.inc_branches_taken();
        m.inc_branches_rejected();
        let delta = m.snapshot().since(&before);
        assert_eq!(delta.branches_taken, 1);
        assert_eq!(delta.branches_rejected, 1);
        assert_eq!(delta.rejection_rate(), Some(0.5));
        assert_eq!(MetricsSnapshot::default().rejection_rate(), None);
    }

    #[test]
    fn test_reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_steps_appended();
        m.inc_routes_composed();
        m.inc_branches_taken();
        m.inc_branches_rejected();
        m.reset();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }
}
