//! Cli: command-line flags. Each flag overrides the file/env value.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "nginx-log-exporter",
    version,
    about = "Exports Prometheus metrics parsed from an nginx access log"
)]
pub struct Cli {
    /// ip-address where exporter listens for connections from Prometheus '<ip-addr>|localhost|*|any'
    #[arg(long = "listen-address")]
    pub listen_address: Option<String>,

    /// port where exporter listens for connections from Prometheus '0-65535'
    #[arg(long = "listen-port")]
    pub listen_port: Option<u16>,

    /// path after http://<listen-address>:<listen-port> where metrics are served
    #[arg(long = "metrics-path")]
    pub metrics_path: Option<String>,

    /// path to the nginx access log
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// enable verbose output for parsing
    #[arg(long = "debug-parse")]
    pub debug_parse: bool,

    /// optional TOML configuration file
    #[arg(long, env = "NGINX_LOG_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,
}
