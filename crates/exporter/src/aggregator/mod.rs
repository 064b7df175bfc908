//! Aggregator: process-wide request metrics fed by the line pipeline.

pub mod store;
pub mod summary;

pub use store::{AggregateSnapshot, Aggregator, RequestKey};
pub use summary::DurationSummary;
