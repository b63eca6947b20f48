use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use votings_node::{
    cli::Cli,
    commands,
    config::{NodeConfig, DEFAULT_LOG_FILTER},
    logging,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Before `deploy` there is no config yet; log next to where it will be.
    let (filter, audit_log) = match NodeConfig::load_from_file(&cli.config) {
        Ok(config) => (config.log_filter.clone(), NodeConfig::resolve(&cli.config, &config.audit_log)),
        Err(_) => (
            DEFAULT_LOG_FILTER.to_string(),
            NodeConfig::resolve(&cli.config, std::path::Path::new("logs/audit.log")),
        ),
    };
    let _guard = logging::init(&filter, &audit_log);

    match commands::run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            // `_guard` flushes the audit file on drop; no `process::exit` here.
            ExitCode::FAILURE
        }
    }
}
