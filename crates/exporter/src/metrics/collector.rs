use std::collections::HashMap;
use std::sync::Arc;

use prometheus::core::{Collector, Desc};
use prometheus::proto::{Counter, LabelPair, Metric, MetricFamily, MetricType, Summary};

use crate::aggregator::Aggregator;
use crate::pipeline::PipelineStats;

pub const DURATION_NAME: &str = "nginx_requests_duration";
pub const DURATION_HELP: &str = "Requests duration.";

pub const REQUESTS_NAME: &str = "nginx_requests_total";
pub const REQUESTS_HELP: &str = "How many HTTP requests processed.";
/// Counter labels, already in lexicographic order.
pub const REQUESTS_LABELS: [&str; 4] = ["code", "country", "domain", "method"];

pub const LINES_NAME: &str = "nginx_log_exporter_lines_total";
pub const LINES_HELP: &str = "Log lines read, by parse outcome.";

/// Exposes the aggregator and pipeline counters to a prometheus registry.
///
/// Nothing is copied into prometheus-owned metrics: every `collect` call
/// takes a fresh snapshot, so scrapes always see the aggregator's current
/// state.
pub struct AccessLogCollector {
    aggregator: Arc<Aggregator>,
    stats: Arc<PipelineStats>,
    descs: Vec<Desc>,
}

impl AccessLogCollector {
    pub fn new(aggregator: Arc<Aggregator>, stats: Arc<PipelineStats>) -> prometheus::Result<Self> {
        let descs = vec![
            Desc::new(DURATION_NAME.into(), DURATION_HELP.into(), vec![], HashMap::new())?,
            Desc::new(
                REQUESTS_NAME.into(),
                REQUESTS_HELP.into(),
                REQUESTS_LABELS.iter().map(|l| l.to_string()).collect(),
                HashMap::new(),
            )?,
            Desc::new(LINES_NAME.into(), LINES_HELP.into(), vec!["outcome".into()], HashMap::new())?,
        ];
        Ok(Self {
            aggregator,
            stats,
            descs,
        })
    }
}

impl Collector for AccessLogCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snap = self.aggregator.snapshot();

        let mut summary = Summary::default();
        summary.set_sample_count(snap.duration.count);
        summary.set_sample_sum(snap.duration.sum);
        let mut duration_metric = Metric::default();
        duration_metric.set_summary(summary);
        let mut duration = family(DURATION_NAME, DURATION_HELP, MetricType::SUMMARY);
        duration.mut_metric().push(duration_metric);

        let mut requests = family(REQUESTS_NAME, REQUESTS_HELP, MetricType::COUNTER);
        for (key, count) in &snap.requests {
            let code = key.code.to_string();
            let values = [code.as_str(), key.country.as_str(), key.domain.as_str(), key.method.as_str()];
            requests
                .mut_metric()
                .push(counter_metric(&REQUESTS_LABELS, &values, *count));
        }

        let stats = self.stats.snapshot();
        let mut lines = family(LINES_NAME, LINES_HELP, MetricType::COUNTER);
        lines
            .mut_metric()
            .push(counter_metric(&["outcome"], &["accepted"], stats.accepted));
        for (reason, count) in &stats.rejected {
            lines
                .mut_metric()
                .push(counter_metric(&["outcome"], &[*reason], *count));
        }

        vec![duration, requests, lines]
    }
}

fn family(name: &str, help: &str, kind: MetricType) -> MetricFamily {
    let mut mf = MetricFamily::default();
    mf.set_name(name.to_string());
    mf.set_help(help.to_string());
    mf.set_field_type(kind);
    mf
}

fn counter_metric(names: &[&str], values: &[&str], count: u64) -> Metric {
    let mut metric = Metric::default();
    for (name, value) in names.iter().zip(values) {
        let mut pair = LabelPair::default();
        pair.set_name(name.to_string());
        pair.set_value(value.to_string());
        metric.mut_label().push(pair);
    }
    let mut counter = Counter::default();
    counter.set_value(count as f64);
    metric.set_counter(counter);
    metric
}
