//! Serve: open the log, bind the listener, run every task until shutdown.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::conf::ExporterConfig;
use crate::error::{ExporterError, ExporterResult};
use crate::http::{self, HttpState};
use crate::metrics::Exposition;
use crate::parser::AccessLogParser;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::runtime::lifecycle::{Lifecycle, Outcome};
use crate::runtime::stop::shutdown_signal;
use crate::tail::FileTailer;

/// Start the tailer, parser pipeline, HTTP server and signal watcher.
///
/// Startup failures (missing log file, bind error) are returned directly.
/// Once running, the first fatal error or shutdown signal stops all tasks
/// and decides the [`Outcome`].
pub async fn run(config: &ExporterConfig) -> ExporterResult<Outcome> {
    let parser = AccessLogParser::new(config.layout.clone())?;
    let aggregator = Arc::new(Aggregator::new());
    let stats = Arc::new(PipelineStats::new());
    let exposition = Exposition::new(Arc::clone(&aggregator), Arc::clone(&stats))?;

    let tailer = FileTailer::open(
        &config.source.log_file,
        Duration::from_millis(config.source.poll_interval_ms),
    )
    .await
    .map_err(|e| {
        error!("{}", e);
        e
    })?
    .with_max_line_bytes(config.source.max_line_bytes);

    let addr = config.server.socket_addr().map_err(ExporterError::Config)?;
    let listener = http::bind(addr).await.map_err(|e| {
        error!("{}", e);
        e
    })?;
    let router = http::build_router(
        HttpState::new(exposition, &config.server.metrics_path),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let lifecycle = Lifecycle::new();
    let (line_tx, line_rx) = mpsc::channel(config.source.channel_capacity);

    let handle = lifecycle.handle();
    tokio::spawn(async move {
        if let Err(e) = tailer.run(line_tx, handle.cancel_token()).await {
            handle.fatal(e).await;
        }
    });

    let handle = lifecycle.handle();
    let pipeline = Pipeline::new(parser, aggregator, stats, config.debug_parse);
    tokio::spawn(async move {
        pipeline.run(line_rx, handle.cancel_token()).await;
        drop(handle);
    });

    let handle = lifecycle.handle();
    tokio::spawn(async move {
        if let Err(e) = http::serve(listener, router, handle.cancel_token()).await {
            handle.fatal(e).await;
        }
    });

    let handle = lifecycle.handle();
    tokio::spawn(async move {
        let cancel = handle.cancel_token();
        tokio::select! {
            _ = shutdown_signal() => handle.shutdown().await,
            _ = cancel.cancelled() => {}
        }
    });

    info!("✓ Nginx log exporter is ready!");
    info!(
        "Serving metrics on: http://{}{}",
        config.server.display_host(),
        config.server.metrics_path
    );

    let outcome = lifecycle.wait().await;
    info!("Exporter stopped ({:?})", outcome);
    Ok(outcome)
}
