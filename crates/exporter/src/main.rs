use clap::Parser;
use std::process::ExitCode;

use nginx_log_exporter::conf::Cli;
use nginx_log_exporter::runtime::{boot, serve};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = {
        let _basic_tracing = boot::init_logging_basic();
        boot::load_config(&cli)?
    };
    boot::init_logging(&config)?;

    let outcome = serve::run(&config).await?;
    Ok(outcome.exit_code())
}
