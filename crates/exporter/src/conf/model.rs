use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::parser::FieldLayout;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub layout: FieldLayout,
    pub logging: LoggingConfig,
    /// Per-line diagnostics for rejected and accepted lines.
    #[serde(default)]
    pub debug_parse: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// `<ip-addr>`, `localhost`, `*` or `any`
    pub listen_address: String,
    pub listen_port: u16,
    pub metrics_path: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub log_file: PathBuf,
    /// How long the tailer sleeps at end of file before checking again.
    pub poll_interval_ms: u64,
    /// Lines buffered between the tailer and the parser.
    pub channel_capacity: usize,
    /// Largest unterminated line held while waiting for its newline.
    pub max_line_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    File { path: String },
}

impl ServerConfig {
    /// Resolve `listen_address` and `listen_port` into a bindable address.
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        let ip = match self.listen_address.trim() {
            "" | "*" | "any" => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            "localhost" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .map_err(|e| format!("invalid listen_address '{}': {}", other, e))?,
        };
        Ok(SocketAddr::new(ip, self.listen_port))
    }

    /// Address to show in log lines and links; wildcard stays readable.
    pub fn display_host(&self) -> String {
        match self.socket_addr() {
            Ok(addr) if addr.ip().is_unspecified() => format!("*:{}", addr.port()),
            Ok(addr) => addr.to_string(),
            Err(_) => format!("{}:{}", self.listen_address, self.listen_port),
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_address: "*".to_string(),
                listen_port: 9113,
                metrics_path: "/metrics".to_string(),
                request_timeout_secs: 10,
            },
            source: SourceConfig {
                log_file: PathBuf::from("/var/log/nginx/access.log"),
                poll_interval_ms: 250,
                channel_capacity: 1024,
                max_line_bytes: 1024 * 1024,
            },
            layout: FieldLayout::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stdout,
            },
            debug_parse: false,
        }
    }
}
