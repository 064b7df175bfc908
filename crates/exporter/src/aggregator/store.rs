use parking_lot::RwLock;
use std::collections::HashMap;

use super::summary::DurationSummary;
use crate::parser::{Country, Method, ParsedRequest};

/// Label set of the request counter: `(country, domain, method, code)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub country: Country,
    pub domain: String,
    pub method: Method,
    pub code: u16,
}

impl RequestKey {
    pub fn new(country: Country, domain: impl Into<String>, method: Method, code: u16) -> Self {
        Self {
            country,
            domain: domain.into(),
            method,
            code,
        }
    }
}

impl From<&ParsedRequest> for RequestKey {
    fn from(request: &ParsedRequest) -> Self {
        Self {
            country: request.country.clone(),
            domain: request.domain.clone(),
            method: request.method,
            code: request.status_code,
        }
    }
}

#[derive(Debug, Default)]
struct AggregateState {
    duration: DurationSummary,
    requests: HashMap<RequestKey, u64>,
}

/// Aggregate request metrics for the lifetime of the process.
///
/// # Concurrency
///
/// One consumer task records, any number of scrape handlers read. Both the
/// summary and the counter map live behind a single `RwLock`, so a
/// [`snapshot`](Aggregator::snapshot) always reflects a point in time
/// between two `record` calls and a counter is never read half-updated.
/// The write section is a hash lookup and two additions.
///
/// Keys are never evicted. Label cardinality grows with the number of
/// distinct `(country, domain, method, code)` tuples seen.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: RwLock<AggregateState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one accepted request.
    pub fn record(&self, request: &ParsedRequest) {
        let key = RequestKey::from(request);
        let mut state = self.state.write();
        state.duration.observe(request.duration_seconds);
        *state.requests.entry(key).or_insert(0) += 1;
    }

    pub fn duration(&self) -> DurationSummary {
        self.state.read().duration
    }

    pub fn request_count(&self, key: &RequestKey) -> u64 {
        self.state.read().requests.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct counter series.
    pub fn series_count(&self) -> usize {
        self.state.read().requests.len()
    }

    /// Copy out the current state, with series sorted by label values.
    pub fn snapshot(&self) -> AggregateSnapshot {
        let (duration, mut requests) = {
            let state = self.state.read();
            let requests: Vec<(RequestKey, u64)> = state
                .requests
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect();
            (state.duration, requests)
        };
        requests.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        AggregateSnapshot { duration, requests }
    }
}

/// A point-in-time copy of the aggregate state.
#[derive(Debug, Clone)]
pub struct AggregateSnapshot {
    pub duration: DurationSummary,
    pub requests: Vec<(RequestKey, u64)>,
}

impl AggregateSnapshot {
    pub fn total_requests(&self) -> u64 {
        self.requests.iter().map(|(_, n)| n).sum()
    }
}
