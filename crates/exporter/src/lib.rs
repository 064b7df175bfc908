//! Prometheus exporter for nginx access logs.
//!
//! A [`tail::FileTailer`] follows the log, the [`pipeline::Pipeline`] parses
//! each line and records accepted requests in the [`aggregator::Aggregator`],
//! and [`http`] serves the aggregate in the Prometheus text format.

pub mod aggregator;
pub mod conf;
pub mod error;
pub mod http;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod runtime;
pub mod tail;
