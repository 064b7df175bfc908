/// Running count and sum of observed request durations.
///
/// Individual samples are not retained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationSummary {
    pub count: u64,
    pub sum: f64,
}

impl DurationSummary {
    #[inline]
    pub fn observe(&mut self, seconds: f64) {
        self.count += 1;
        self.sum += seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = DurationSummary::default();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.sum, 0.0);
    }

    #[test]
    fn test_observe_accumulates() {
        let mut summary = DurationSummary::default();
        summary.observe(0.5);
        summary.observe(1.5);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.sum, 2.0);
    }
}
