//! Load: layered config: defaults, TOML file, environment, flags.

use anyhow::{Context, Result};
use regex::Regex;

use super::cli::Cli;
use super::model::ExporterConfig;
use crate::error::{ExporterError, ExporterResult};

/// Prefix for environment overrides, e.g. `NGINX_LOG_EXPORTER_SERVER__LISTEN_PORT`.
pub const ENV_PREFIX: &str = "NGINX_LOG_EXPORTER";

const METRICS_PATH_PATTERN: &str = r"^/[A-Za-z0-9_/-]*$";

impl ExporterConfig {
    /// Load configuration.
    /// Priority: Flags > Environment Variables > Config File > Defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&ExporterConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = &cli.config {
            tracing::info!("Loading configuration from: {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("server.listen_address", cli.listen_address.clone())?
            .set_override_option("server.listen_port", cli.listen_port.map(i64::from))?
            .set_override_option("server.metrics_path", cli.metrics_path.clone())?
            .set_override_option(
                "source.log_file",
                cli.log_file.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )?;
        if cli.debug_parse {
            builder = builder.set_override("debug_parse", true)?;
        }

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check values that would otherwise fail later at bind or route time.
    pub fn validate(&self) -> ExporterResult<()> {
        let path_pattern = Regex::new(METRICS_PATH_PATTERN)?;
        let path = &self.server.metrics_path;
        if !path_pattern.is_match(path) {
            return Err(ExporterError::Config(format!(
                "metrics_path '{}' must match {}",
                path, METRICS_PATH_PATTERN
            )));
        }
        if path == "/" {
            return Err(ExporterError::Config(
                "metrics_path must not be '/', the root page is served there".to_string(),
            ));
        }

        self.server.socket_addr().map_err(ExporterError::Config)?;

        if self.source.log_file.as_os_str().is_empty() {
            return Err(ExporterError::Config("log_file must not be empty".to_string()));
        }
        if self.source.poll_interval_ms == 0 {
            return Err(ExporterError::Config("poll_interval_ms must be > 0".to_string()));
        }
        if self.source.channel_capacity == 0 {
            return Err(ExporterError::Config("channel_capacity must be > 0".to_string()));
        }
        if self.source.max_line_bytes == 0 {
            return Err(ExporterError::Config("max_line_bytes must be > 0".to_string()));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ExporterError::Config("request_timeout_secs must be > 0".to_string()));
        }

        self.layout.validate().map_err(ExporterError::Config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::model::LogFormat;
    use std::io::Write;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    fn valid_config() -> ExporterConfig {
        ExporterConfig::default()
    }

    // ── Defaults ────────────────────────────────────────────────

    #[test]
    fn test_defaults_match_original_flags() {
        let config = ExporterConfig::default();
        assert_eq!(config.server.listen_address, "*");
        assert_eq!(config.server.listen_port, 9113);
        assert_eq!(config.server.metrics_path, "/metrics");
        assert_eq!(config.source.log_file, PathBuf::from("/var/log/nginx/access.log"));
        assert!(!config.debug_parse);
        assert!(config.validate().is_ok());
    }

    // ── Validation ──────────────────────────────────────────────

    #[test]
    fn test_validate_metrics_path() {
        for ok in ["/metrics", "/a/b-c_d", "/x1"] {
            let mut config = valid_config();
            config.server.metrics_path = ok.to_string();
            assert!(config.validate().is_ok(), "{}", ok);
        }
        for bad in ["metrics", "/metrics?x=1", "/metr ics", "", "/"] {
            let mut config = valid_config();
            config.server.metrics_path = bad.to_string();
            assert!(config.validate().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_validate_bad_listen_address() {
        let mut config = valid_config();
        config.server.listen_address = "not-an-ip".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listen_address"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = valid_config();
        config.source.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_max_line_bytes() {
        let mut config = valid_config();
        config.source.max_line_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_line_bytes"));
    }

    #[test]
    fn test_validate_bad_layout() {
        let mut config = valid_config();
        config.layout.min_tokens = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout"));
    }

    // ── Listen address resolution ───────────────────────────────

    #[test]
    fn test_socket_addr_keywords() {
        let mut config = valid_config();
        for wildcard in ["*", "any", ""] {
            config.server.listen_address = wildcard.to_string();
            assert_eq!(
                config.server.socket_addr().unwrap(),
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9113)
            );
        }
        config.server.listen_address = "localhost".to_string();
        assert_eq!(
            config.server.socket_addr().unwrap(),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9113)
        );
    }

    #[test]
    fn test_socket_addr_literals() {
        let mut config = valid_config();
        config.server.listen_address = "10.1.2.3".to_string();
        config.server.listen_port = 0;
        assert_eq!(config.server.socket_addr().unwrap().to_string(), "10.1.2.3:0");

        config.server.listen_address = "[::1]".to_string();
        assert_eq!(config.server.socket_addr().unwrap().to_string(), "[::1]:0");
    }

    #[test]
    fn test_display_host() {
        let config = valid_config();
        assert_eq!(config.server.display_host(), "*:9113");
    }

    // ── Layering ────────────────────────────────────────────────

    #[test]
    fn test_load_file_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
debug_parse = false

[server]
listen_port = 9300
metrics_path = "/from-file"

[source]
log_file = "/srv/log/access.log"

[logging]
level = "debug"
format = "json"
output = "stdout"
"#
        )
        .unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            metrics_path: Some("/from-flag".to_string()),
            debug_parse: true,
            ..Cli::default()
        };
        let config = ExporterConfig::load(&cli).unwrap();
        assert_eq!(config.server.listen_port, 9300);
        assert_eq!(config.server.metrics_path, "/from-flag");
        assert_eq!(config.source.log_file, PathBuf::from("/srv/log/access.log"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.debug_parse);
        // Untouched keys keep their defaults.
        assert_eq!(config.server.listen_address, "*");
        assert_eq!(config.layout.min_tokens, 16);
    }

    #[test]
    fn test_env_overrides_file_but_not_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[source]
poll_interval_ms = 100
channel_capacity = 64
"#
        )
        .unwrap();

        std::env::set_var("NGINX_LOG_EXPORTER_SOURCE__POLL_INTERVAL_MS", "750");
        std::env::set_var("NGINX_LOG_EXPORTER_SERVER__METRICS_PATH", "/from-env");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            metrics_path: Some("/from-flag".to_string()),
            ..Cli::default()
        };
        let loaded = ExporterConfig::load(&cli);
        std::env::remove_var("NGINX_LOG_EXPORTER_SOURCE__POLL_INTERVAL_MS");
        std::env::remove_var("NGINX_LOG_EXPORTER_SERVER__METRICS_PATH");

        let config = loaded.unwrap();
        assert_eq!(config.source.poll_interval_ms, 750);
        assert_eq!(config.source.channel_capacity, 64);
        assert_eq!(config.server.metrics_path, "/from-flag");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/exporter.toml")),
            ..Cli::default()
        };
        assert!(ExporterConfig::load(&cli).is_err());
    }
}
