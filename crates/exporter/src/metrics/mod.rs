//! Metrics: prometheus text exposition of the aggregate state.

pub mod collector;

use std::sync::Arc;
use prometheus::{Encoder, Registry, TextEncoder};

use crate::aggregator::Aggregator;
use crate::error::ExporterResult;
use crate::pipeline::PipelineStats;

pub use collector::AccessLogCollector;

/// Private registry holding only this exporter's collector.
#[derive(Clone)]
pub struct Exposition {
    registry: Registry,
}

impl Exposition {
    pub fn new(aggregator: Arc<Aggregator>, stats: Arc<PipelineStats>) -> ExporterResult<Self> {
        let registry = Registry::new();
        registry.register(Box::new(AccessLogCollector::new(aggregator, stats)?))?;
        Ok(Self { registry })
    }

    /// Serialize the current state in the text exposition format.
    pub fn render(&self) -> ExporterResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}
