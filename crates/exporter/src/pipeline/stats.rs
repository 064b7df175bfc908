use std::sync::atomic::{AtomicU64, Ordering};

use crate::parser::Rejection;

/// Line outcome counters for the consumer task.
///
/// All operations use `Ordering::Relaxed`. These are self-observability
/// counters; the snapshot may be off by one line between fields while the
/// consumer is running.
#[derive(Debug, Default)]
pub struct PipelineStats {
    lines: AtomicU64,
    accepted: AtomicU64,
    unknown_country: AtomicU64,
    rejected: [AtomicU64; Rejection::COUNT],
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_accepted(&self, unknown_country: bool) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.accepted.fetch_add(1, Ordering::Relaxed);
        if unknown_country {
            self.unknown_country.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_rejected(&self, rejection: &Rejection) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.rejected[rejection.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let rejected = Rejection::REASONS
            .iter()
            .zip(self.rejected.iter())
            .map(|(reason, n)| (*reason, n.load(Ordering::Relaxed)))
            .collect();

        StatsSnapshot {
            lines_read: self.lines.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            unknown_country: self.unknown_country.load(Ordering::Relaxed),
            rejected,
        }
    }
}

/// A read-only copy of [`PipelineStats`].
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub lines_read: u64,
    pub accepted: u64,
    /// Accepted lines whose country fell back to `-`.
    pub unknown_country: u64,
    /// `(reason, count)` in [`Rejection::REASONS`] order.
    pub rejected: Vec<(&'static str, u64)>,
}

impl StatsSnapshot {
    pub fn rejected_total(&self) -> u64 {
        self.rejected.iter().map(|(_, n)| n).sum()
    }

    pub fn rejected_for(&self, reason: &str) -> u64 {
        self.rejected
            .iter()
            .find(|(r, _)| *r == reason)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_empty() {
        let snap = PipelineStats::new().snapshot();
        assert_eq!(snap.lines_read, 0);
        assert_eq!(snap.accepted, 0);
        assert_eq!(snap.rejected_total(), 0);
        assert_eq!(snap.rejected.len(), Rejection::COUNT);
    }

    #[test]
    fn test_outcomes_are_counted_per_reason() {
        let stats = PipelineStats::new();
        stats.record_accepted(false);
        stats.record_accepted(true);
        stats.record_rejected(&Rejection::BadMethod);
        stats.record_rejected(&Rejection::BadMethod);
        stats.record_rejected(&Rejection::TooFewTokens { found: 2, required: 16 });

        let snap = stats.snapshot();
        assert_eq!(snap.lines_read, 5);
        assert_eq!(snap.accepted, 2);
        assert_eq!(snap.unknown_country, 1);
        assert_eq!(snap.rejected_for("bad-method"), 2);
        assert_eq!(snap.rejected_for("too-few-tokens"), 1);
        assert_eq!(snap.rejected_for("bad-domain"), 0);
        assert_eq!(snap.rejected_total(), 3);
    }
}
