use std::process::ExitCode;

use clap::Parser;

use serw::cli::Cli;
use serw::config::{Config, ServerConfig};
use serw::error::StartupError;
use serw::{logger, server};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match start(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Shown even with --silent
            eprintln!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}

fn start(cli: &Cli) -> Result<(), StartupError> {
    let cfg = Config::load(cli)?;
    logger::init(&cfg.logging)?;

    let config = ServerConfig::from_config(cfg)?;

    // Build the Tokio runtime, sizing the worker pool from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = config.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(server::run(config))
}
