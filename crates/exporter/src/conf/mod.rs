pub mod cli;
pub mod load;
pub mod model;

pub use cli::Cli;
pub use load::ENV_PREFIX;
pub use model::{ExporterConfig, LogFormat, LogOutput, LoggingConfig, ServerConfig, SourceConfig};
