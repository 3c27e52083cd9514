//! timetable-server entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use timetable_core::init_tracing;
use timetable_server::cli::Cli;
use timetable_server::{ServerResult, SignalHandler, serve};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(config.tracing_config()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: timetable_server::ServerConfig) -> ServerResult<()> {
    info!(
        port = config.port,
        database = %config.database_path().display(),
        "Starting timetable-server"
    );

    let signals = SignalHandler::new();
    signals.spawn_listener()?;

    serve(&config, signals.shutdown()).await
}
