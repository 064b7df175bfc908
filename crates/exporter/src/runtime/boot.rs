//! Boot: logging init and config load.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

use crate::conf::{Cli, ExporterConfig, LogFormat, LogOutput};
use crate::pipeline::PARSE_TARGET;

/// Phase 1: Basic tracing init so we can log during config loading.
/// Uses RUST_LOG env var or a sensible default.
pub fn init_logging_basic() -> tracing::subscriber::DefaultGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nginx_log_exporter=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Load and validate configuration, logging what was resolved.
pub fn load_config(cli: &Cli) -> Result<ExporterConfig> {
    info!("Starting nginx log exporter v{}", env!("CARGO_PKG_VERSION"));

    let config = ExporterConfig::load(cli)?;
    config.validate().context("Invalid configuration")?;

    info!(
        "Loaded configuration: listen={}, metrics_path={}, log_file={}",
        config.server.display_host(),
        config.server.metrics_path,
        config.source.log_file.display()
    );
    if config.debug_parse {
        info!("Per-line parse diagnostics enabled");
    }
    Ok(config)
}

/// Level filter: RUST_LOG wins over the configured level. Parse
/// diagnostics are switched on independently of either.
fn env_filter(level: &str, debug_parse: bool) -> Result<EnvFilter> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid logging.level '{}'", level))?,
    };
    if debug_parse {
        let directive = format!("{}=debug", PARSE_TARGET)
            .parse::<Directive>()
            .context("Invalid parse directive")?;
        return Ok(filter.add_directive(directive));
    }
    Ok(filter)
}

/// Phase 2: Re-initialize tracing with configuration values.
/// This installs the global subscriber the rest of the process uses.
pub fn init_logging(config: &ExporterConfig) -> Result<()> {
    let filter = env_filter(&config.logging.level, config.debug_parse)?;

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            let layer = fmt::layer().json().with_target(true).with_thread_ids(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let file = open_log_output(path)?;
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        (LogFormat::Pretty, LogOutput::Stdout) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let file = open_log_output(path)?;
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }
    Ok(())
}

fn open_log_output(path: &str) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file '{}'", path))
}
