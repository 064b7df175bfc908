use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions. Any of these ends the process.
///
/// Per-line problems are not errors; see [`crate::parser::Rejection`].
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Log file unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Invalid field layout: {0}")]
    Layout(String),

    #[error("Invalid field grammar: {0}")]
    Grammar(#[from] regex::Error),
}

// Convenience type alias
pub type ExporterResult<T> = Result<T, ExporterError>;
