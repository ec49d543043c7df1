mod cli;
mod commands;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use rxnet::core::models::network::ReactionNetworkConfig;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\nError: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    color_eyre::install().map_err(|e| anyhow::anyhow!("failed to install panic hooks: {e}"))?;

    info!("rxnet v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = ReactionNetworkConfig::load(&cli.config)?;
    let system_dir = cli
        .dir
        .clone()
        .map_or_else(std::env::current_dir, Ok)?;
    debug!(system_dir = %system_dir.display(), "resolved system directory");

    let command_result = match cli.command {
        Commands::Generate(args) => commands::generate::run(args, &config, &system_dir),
        Commands::Status(args) => commands::status::run(args, &config, &system_dir),
        Commands::Extract(args) => commands::extract::run(args, &config, &system_dir),
    };

    match &command_result {
        Ok(_) => info!("Command completed successfully."),
        Err(e) => {
            error!("Command failed: {e}");
        }
    }
    command_result
}
