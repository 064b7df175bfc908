//! Pipeline: the consumer task between the line source and the aggregator.
//!
//! This task is the only writer of the [`Aggregator`]. Each line is parsed
//! and recorded synchronously; rejected lines are counted and dropped.

pub mod stats;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::parser::{AccessLogParser, Rejection, RequestParser};

pub use stats::{PipelineStats, StatsSnapshot};

/// Target for per-line diagnostics, enabled by `--debug-parse`.
pub const PARSE_TARGET: &str = "parse";

pub struct Pipeline<P = AccessLogParser> {
    parser: P,
    aggregator: Arc<Aggregator>,
    stats: Arc<PipelineStats>,
    debug_parse: bool,
}

impl<P: RequestParser> Pipeline<P> {
    pub fn new(
        parser: P,
        aggregator: Arc<Aggregator>,
        stats: Arc<PipelineStats>,
        debug_parse: bool,
    ) -> Self {
        Self {
            parser,
            aggregator,
            stats,
            debug_parse,
        }
    }

    /// Parse one raw line and record it if every strict field is valid.
    pub fn process_line(&self, raw: &str) -> Result<(), Rejection> {
        match self.parser.parse(raw) {
            Ok(request) => {
                let unknown_country = request.country.is_unknown();
                self.aggregator.record(&request);
                self.stats.record_accepted(unknown_country);

                if self.debug_parse {
                    if unknown_country {
                        debug!(target: PARSE_TARGET, line = raw, "can't parse COUNTRY from log string");
                    }
                    debug!(
                        target: PARSE_TARGET,
                        country = %request.country,
                        domain = %request.domain,
                        method = %request.method,
                        code = request.status_code,
                        duration = request.duration_seconds,
                        "Parsed string from log"
                    );
                }
                Ok(())
            }
            Err(rejection) => {
                self.stats.record_rejected(&rejection);
                if self.debug_parse {
                    debug!(
                        target: PARSE_TARGET,
                        reason = rejection.as_str(),
                        detail = %rejection,
                        line = raw,
                        "can't parse string from log"
                    );
                }
                Err(rejection)
            }
        }
    }

    /// Consume lines until the source closes or `cancel` fires.
    pub async fn run(self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) {
        info!("Line pipeline started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                line = lines.recv() => match line {
                    Some(line) => {
                        let _ = self.process_line(&line);
                    }
                    None => break,
                },
            }
        }

        let snap = self.stats.snapshot();
        info!(
            lines_read = snap.lines_read,
            accepted = snap.accepted,
            rejected = snap.rejected_total(),
            series = self.aggregator.series_count(),
            "Line pipeline stopped"
        );
    }
}
